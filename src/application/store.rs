use crate::domain::{generate_unique_token, FileRecord, PersistedFile};
use crate::infrastructure::storage::KeyValueStorage;
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

/// Durable storage key holding the metadata projection
pub const METADATA_KEY: &str = "shared_files_metadata";

/// Answer to the "delete this file?" prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

impl From<bool> for Confirmation {
    fn from(confirmed: bool) -> Self {
        if confirmed {
            Confirmation::Confirmed
        } else {
            Confirmation::Declined
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(FileRecord),
    Declined,
    NotFound,
}

/// In-memory file records mirrored, minus content, into durable storage
/// after every mutation.
pub struct MetadataStore {
    files: HashMap<String, FileRecord>,
    storage: Box<dyn KeyValueStorage>,
}

impl MetadataStore {
    /// Read the persisted projection.
    ///
    /// Missing or malformed data yields an empty store; the failure is
    /// logged and never reaches the caller.
    pub fn load(storage: Box<dyn KeyValueStorage>) -> Self {
        let files = match storage.get(METADATA_KEY) {
            Ok(Some(raw)) => Self::parse_projection(&raw),
            Ok(None) => HashMap::new(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to read file metadata from storage");
                HashMap::new()
            }
        };

        tracing::info!(files = files.len(), "Metadata store loaded");
        Self { files, storage }
    }

    fn parse_projection(raw: &str) -> HashMap<String, FileRecord> {
        let projection: HashMap<String, PersistedFile> = match serde_json::from_str(raw) {
            Ok(projection) => projection,
            Err(e) => {
                tracing::error!(error = %e, "Failed to parse stored file metadata, starting empty");
                return HashMap::new();
            }
        };

        projection
            .into_iter()
            .filter_map(|(key, persisted)| {
                if key != persisted.id {
                    tracing::warn!(key = %key, id = %persisted.id, "Skipping metadata entry with mismatched id");
                    return None;
                }
                Some((key, FileRecord::from(persisted)))
            })
            .collect()
    }

    /// Insert `record` under its id, replacing any previous entry
    pub fn upload(&mut self, record: FileRecord) {
        tracing::info!(id = %record.id, name = %record.original_name, size = record.size, "File stored");
        self.files.insert(record.id.clone(), record);
        self.persist();
    }

    /// Bump the download counter; returns the new count, or `None` for an
    /// unknown id (no mutation, nothing persisted)
    pub fn increment_download(&mut self, id: &str) -> Option<u64> {
        let record = self.files.get_mut(id)?;
        record.download_count += 1;
        let count = record.download_count;
        self.persist();
        Some(count)
    }

    pub fn delete(&mut self, id: &str, confirmation: Confirmation) -> DeleteOutcome {
        if confirmation == Confirmation::Declined {
            return DeleteOutcome::Declined;
        }

        match self.files.remove(id) {
            Some(record) => {
                tracing::info!(id = %id, "File deleted");
                self.persist();
                DeleteOutcome::Deleted(record)
            }
            None => DeleteOutcome::NotFound,
        }
    }

    /// Write the content-free projection, overwriting the previous value.
    ///
    /// Failures (including quota overflow) are logged; in-memory state is
    /// left untouched.
    pub fn persist(&mut self) {
        let serialized = match serde_json::to_string(&self.projection()) {
            Ok(serialized) => serialized,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize file metadata");
                return;
            }
        };

        if let Err(e) = self.storage.set(METADATA_KEY, &serialized) {
            tracing::warn!(error = %e, "Failed to persist file metadata");
        }
    }

    pub fn projection(&self) -> BTreeMap<String, PersistedFile> {
        self.files
            .iter()
            .map(|(id, record)| (id.clone(), PersistedFile::from(record)))
            .collect()
    }

    /// A share token not used by any record
    pub fn next_id(&self) -> String {
        generate_unique_token(|candidate| self.files.contains_key(candidate))
    }

    pub fn get(&self, id: &str) -> Option<&FileRecord> {
        self.files.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.files.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Newest first by parsed upload time; unparseable times go last
    pub fn list_recent_first(&self) -> Vec<&FileRecord> {
        let mut records: Vec<&FileRecord> = self.files.values().collect();
        records.sort_by(|a, b| {
            Reverse(a.uploaded_at())
                .cmp(&Reverse(b.uploaded_at()))
                .then_with(|| a.id.cmp(&b.id))
        });
        records
    }
}
