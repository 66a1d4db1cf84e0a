use crate::domain::FileRecord;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;

/// Progress gained per tick of the simulated upload
pub const PROGRESS_STEP: u8 = 10;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Filename cannot be empty")]
    EmptyFilename,

    #[error("File too large: {size} bytes exceeds {max} bytes")]
    TooLarge { size: usize, max: usize },

    #[error("Invalid base64 content: {0}")]
    InvalidContent(#[from] base64::DecodeError),
}

/// A file picked by the user, bytes already read
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub media_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub delay: Duration,
    pub tick: Duration,
    pub max_bytes: usize,
    pub public_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadState {
    Idle,
    Uploading { progress: u8 },
    Completed { id: String, share_url: String },
}

/// Next progress value; never exceeds 100
pub fn advance_progress(progress: u8) -> u8 {
    progress.saturating_add(PROGRESS_STEP).min(100)
}

/// Shareable link for a file id under `public_url`
pub fn share_url(public_url: &str, id: &str) -> String {
    format!("{}/file/{}", public_url.trim_end_matches('/'), id)
}

pub struct UploadFlow {
    settings: UploadSettings,
    state: watch::Sender<UploadState>,
}

impl UploadFlow {
    pub fn new(settings: UploadSettings) -> Self {
        let (state, _) = watch::channel(UploadState::Idle);
        Self { settings, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> UploadState {
        self.state.borrow().clone()
    }

    pub fn validate(&self, file: &SelectedFile) -> Result<(), UploadError> {
        if file.name.trim().is_empty() {
            return Err(UploadError::EmptyFilename);
        }

        if file.bytes.len() > self.settings.max_bytes {
            return Err(UploadError::TooLarge {
                size: file.bytes.len(),
                max: self.settings.max_bytes,
            });
        }

        Ok(())
    }

    /// Run the simulated upload.
    ///
    /// Progress ticks on a fixed schedule while the delay runs; once it
    /// elapses `submit` receives a function that builds the record from a
    /// fresh id, and the flow moves to `Completed`.
    pub async fn execute<F, E>(&self, file: SelectedFile, submit: F) -> Result<FileRecord, E>
    where
        F: FnOnce(&dyn Fn(&str) -> FileRecord) -> Result<FileRecord, E>,
        E: From<UploadError>,
    {
        self.validate(&file)?;

        self.state.send_replace(UploadState::Uploading { progress: 0 });
        self.simulate_progress().await;

        let build = |id: &str| FileRecord::new(id, &file.name, file.media_type.as_deref(), &file.bytes);
        let record = submit(&build)?;

        tracing::info!(id = %record.id, name = %record.original_name, "Upload completed");
        self.state.send_replace(UploadState::Completed {
            id: record.id.clone(),
            share_url: share_url(&self.settings.public_url, &record.id),
        });

        Ok(record)
    }

    async fn simulate_progress(&self) {
        let deadline = tokio::time::sleep(self.settings.delay);
        tokio::pin!(deadline);

        if self.settings.tick.is_zero() {
            deadline.await;
            return;
        }

        let start = tokio::time::Instant::now() + self.settings.tick;
        let mut ticker = tokio::time::interval_at(start, self.settings.tick);
        let mut progress = 0;

        loop {
            tokio::select! {
                biased;
                _ = &mut deadline => break,
                _ = ticker.tick() => {
                    progress = advance_progress(progress);
                    tracing::debug!(progress, "Upload progress");
                    self.state.send_replace(UploadState::Uploading { progress });
                }
            }
        }
    }
}
