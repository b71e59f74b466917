use std::sync::Arc;

use crate::application::ConversationOrchestrator;
use crate::infrastructure::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ConversationOrchestrator>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(orchestrator: Arc<ConversationOrchestrator>, config: AppConfig) -> Self {
        Self {
            orchestrator,
            config: Arc::new(config),
        }
    }
}
