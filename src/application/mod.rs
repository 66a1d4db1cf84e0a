pub mod auth;
pub mod context;
pub mod download;
pub mod router;
pub mod store;
pub mod types;
pub mod upload;

pub use auth::{AuthError, AuthGate, AuthState, Credentials, SessionRegistry};
pub use context::{AppContext, SharedContext};
pub use download::{download, DownloadOutcome, FilePayload};
pub use router::{navigate, Navigation, Route};
pub use store::{Confirmation, DeleteOutcome, MetadataStore};
pub use types::{DeleteStatus, FileSummary, LoginRequest, UploadRequest, ViewResponse};
pub use upload::{SelectedFile, UploadError, UploadFlow, UploadSettings, UploadState};
