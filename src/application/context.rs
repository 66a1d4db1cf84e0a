use crate::application::auth::{Credentials, SessionRegistry};
use crate::application::store::MetadataStore;
use crate::application::upload::UploadSettings;
use crate::config::Config;
use crate::infrastructure::storage::{KeyValueStorage, SqliteStorage, StorageError};
use std::sync::{Arc, Mutex};

pub type SharedContext = Arc<Mutex<AppContext>>;

/// All mutable application state, created once at startup and handed to
/// the request handlers
pub struct AppContext {
    pub config: Config,
    pub store: MetadataStore,
    pub sessions: SessionRegistry,
}

impl AppContext {
    pub fn new(config: Config, durable: Box<dyn KeyValueStorage>) -> Self {
        let credentials = Credentials::new(&config.admin_email, &config.admin_password);
        Self {
            store: MetadataStore::load(durable),
            sessions: SessionRegistry::new(credentials),
            config,
        }
    }

    /// Open the configured SQLite database, falling back to an in-memory one
    pub fn open(config: Config) -> Result<Self, StorageError> {
        let storage = SqliteStorage::new(&config.database_path).or_else(|e| {
            tracing::warn!(
                path = %config.database_path,
                error = %e,
                "Failed to open database, falling back to in-memory storage"
            );
            SqliteStorage::new_in_memory()
        })?;

        let storage = match config.storage_quota_bytes {
            Some(max) => storage.with_quota(max),
            None => storage,
        };

        Ok(Self::new(config, Box::new(storage)))
    }

    pub fn upload_settings(&self) -> UploadSettings {
        UploadSettings {
            delay: self.config.upload_delay,
            tick: self.config.progress_tick,
            max_bytes: self.config.max_upload_bytes,
            public_url: self.config.public_url.clone(),
        }
    }

    pub fn shared(self) -> SharedContext {
        Arc::new(Mutex::new(self))
    }
}
