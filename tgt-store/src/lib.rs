pub mod app_config;
pub mod kv;
pub mod memory_repo;
pub mod redis_repo;

pub use kv::{get_json, set_json, KeyValueStore, StoreError, StoreResult};
pub use memory_repo::MemoryStore;
pub use redis_repo::RedisClient;
