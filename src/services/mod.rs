mod backend;
mod metadata_store;
mod memory_store;
mod mock_ai;
mod redis_service;

pub use backend::AutomationBackend;
pub use metadata_store::MetadataStore;
pub use memory_store::MemoryMetadataStore;
pub use mock_ai::{clean_tags, MockAutomation};
pub use redis_service::RedisMetadataStore;
