use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per session id, so turns and deletes against the same
/// session run one at a time while different sessions proceed in parallel.
#[derive(Debug, Default)]
pub struct SessionLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

pub struct SessionGuard<'a> {
    guard: Option<OwnedMutexGuard<()>>,
    session_id: String,
    locks: &'a SessionLocks,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, session_id: &str) -> SessionGuard<'_> {
        let lock = self
            .locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        SessionGuard {
            guard: Some(lock.lock_owned().await),
            session_id: session_id.to_string(),
            locks: self,
        }
    }

    /// Number of sessions with a live lock entry.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the map still holds the mutex when nobody else is waiting on it.
        self.locks
            .locks
            .remove_if(&self.session_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}
