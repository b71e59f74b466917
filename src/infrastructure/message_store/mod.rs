mod in_memory;
mod redis_store;

pub use in_memory::InMemoryMessageStore;
pub use redis_store::{create_pool, keys, RedisMessageStore, RedisPool};
