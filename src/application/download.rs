use crate::application::store::MetadataStore;
use crate::domain::{ContentSlot, FileRecord};
use sha2::{Digest, Sha256};

/// Shown when a record exists but its bytes are no longer held
pub const CONTENT_UNAVAILABLE_MESSAGE: &str =
    "This file's content is not available in the current session. File content is held in memory only and is not kept across restarts.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePayload {
    pub file_name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
    /// Hex SHA-256 of `bytes`
    pub digest: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    NotFound,
    Ready {
        record: FileRecord,
        payload: FilePayload,
    },
    Unavailable {
        record: FileRecord,
        message: String,
    },
}

/// Look up `id`, count the download and hand back the held bytes.
///
/// Unknown ids leave the store untouched. Known ids are counted exactly
/// once, whether or not their content can still be served.
pub fn download(store: &mut MetadataStore, id: &str) -> DownloadOutcome {
    if !store.contains(id) {
        tracing::debug!(id = %id, "Download requested for unknown file");
        return DownloadOutcome::NotFound;
    }

    store.increment_download(id);

    let record = match store.get(id) {
        Some(record) => record.clone(),
        None => return DownloadOutcome::NotFound,
    };

    let content = match &record.content {
        ContentSlot::Loaded(content) => content,
        ContentSlot::Detached | ContentSlot::Empty => {
            return DownloadOutcome::Unavailable {
                message: CONTENT_UNAVAILABLE_MESSAGE.to_string(),
                record,
            }
        }
    };

    match content.decode() {
        Ok(bytes) => DownloadOutcome::Ready {
            payload: FilePayload {
                file_name: record.original_name.clone(),
                media_type: record.media_type.clone(),
                digest: hex::encode(Sha256::digest(&bytes)),
                bytes,
            },
            record,
        },
        Err(e) => {
            tracing::error!(id = %id, error = %e, "Stored content could not be decoded");
            DownloadOutcome::Unavailable {
                message: CONTENT_UNAVAILABLE_MESSAGE.to_string(),
                record,
            }
        }
    }
}
