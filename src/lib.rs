pub mod application;
pub mod config;
pub mod domain;
pub mod handlers;
pub mod infrastructure;

// Re-export commonly used types
pub use application::{AppContext, MetadataStore, SharedContext};
pub use config::Config;
pub use domain::{FileRecord, PersistedFile};
pub use infrastructure::storage::{KeyValueStorage, MemoryStorage, SqliteStorage};
