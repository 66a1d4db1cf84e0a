pub mod server;
pub mod storage;

pub use storage::{KeyValueStorage, MemoryStorage, SqliteStorage, StorageError};
