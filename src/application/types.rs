use crate::domain::{human_size, FileRecord};
use serde::{Deserialize, Serialize};

/// Request to upload a file
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    /// File name as reported by the client's file system
    pub file_name: String,
    /// MIME type; defaults to application/octet-stream when missing
    #[serde(default)]
    pub media_type: Option<String>,
    /// Base64-encoded file bytes
    pub content: String,
}

/// Admin login form
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public metadata of a shared file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileSummary {
    pub id: String,
    pub original_name: String,
    pub size: u64,
    pub size_label: String,
    pub media_type: String,
    pub upload_time: String,
    pub download_count: u64,
    pub content_available: bool,
    pub share_path: String,
}

impl From<&FileRecord> for FileSummary {
    fn from(record: &FileRecord) -> Self {
        Self {
            id: record.id.clone(),
            original_name: record.original_name.clone(),
            size: record.size,
            size_label: human_size(record.size),
            media_type: record.media_type.clone(),
            upload_time: record.upload_time.clone(),
            download_count: record.download_count,
            content_available: record.has_content(),
            share_path: format!("/file/{}", record.id),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeleteStatus {
    Deleted,
    Declined,
    NotFound,
}

/// Every document the service renders, tagged by `view`
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ViewResponse {
    Upload {
        max_upload_bytes: usize,
        max_upload_label: String,
    },
    UploadComplete {
        file: FileSummary,
        share_url: String,
        /// Last value the progress indicator reached
        progress: u8,
    },
    File {
        file: FileSummary,
        download_path: String,
    },
    FileNotFound {
        id: String,
        message: String,
        home: String,
    },
    ContentUnavailable {
        file: FileSummary,
        message: String,
    },
    Login {
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Dashboard {
        total: usize,
        files: Vec<FileSummary>,
    },
    ConfirmDelete {
        id: String,
        original_name: String,
        prompt: String,
        confirm_path: String,
        decline_path: String,
    },
    DeleteResult {
        id: String,
        outcome: DeleteStatus,
    },
    Redirect {
        location: String,
    },
    NotFound {
        path: String,
        home: String,
    },
}

impl ViewResponse {
    pub fn file_not_found(id: &str) -> Self {
        ViewResponse::FileNotFound {
            id: id.to_string(),
            message: "The file does not exist. The link may be wrong or the file may have been deleted.".to_string(),
            home: "/".to_string(),
        }
    }

    pub fn not_found(path: &str) -> Self {
        ViewResponse::NotFound {
            path: path.to_string(),
            home: "/".to_string(),
        }
    }

    pub fn dashboard<'a>(files: impl IntoIterator<Item = &'a FileRecord>) -> Self {
        let files: Vec<FileSummary> = files.into_iter().map(FileSummary::from).collect();
        ViewResponse::Dashboard {
            total: files.len(),
            files,
        }
    }
}
