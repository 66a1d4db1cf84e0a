use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Media type used when the uploaded file does not carry one
pub const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

/// Display format of `upload_time`, also used to parse it back for ordering
pub const UPLOAD_TIME_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

/// Sentinel written in place of content in the persisted projection
pub const HIDDEN_CONTENT_MARKER: &str = "HIDDEN_FOR_STORAGE";

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Content is not a data URL")]
    NotDataUrl,

    #[error("Data URL is not base64 encoded")]
    NotBase64,

    #[error("Invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// File bytes held as an inline `data:<type>;base64,<payload>` URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    data_url: String,
}

impl FileContent {
    pub fn encode(media_type: &str, bytes: &[u8]) -> Self {
        let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
        Self {
            data_url: format!("data:{};base64,{}", media_type, payload),
        }
    }

    pub fn from_data_url(data_url: impl Into<String>) -> Result<Self, ContentError> {
        let content = Self {
            data_url: data_url.into(),
        };
        content.split()?;
        Ok(content)
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    pub fn media_type(&self) -> Result<&str, ContentError> {
        self.split().map(|(media_type, _)| media_type)
    }

    pub fn decode(&self) -> Result<Vec<u8>, ContentError> {
        let (_, payload) = self.split()?;
        Ok(base64::engine::general_purpose::STANDARD.decode(payload)?)
    }

    fn split(&self) -> Result<(&str, &str), ContentError> {
        let rest = self
            .data_url
            .strip_prefix("data:")
            .ok_or(ContentError::NotDataUrl)?;
        // Media type parameters may hold commas; base64 never does
        let (header, payload) = rest.rsplit_once(',').ok_or(ContentError::NotDataUrl)?;
        let media_type = header
            .strip_suffix(";base64")
            .ok_or(ContentError::NotBase64)?;
        Ok((media_type, payload))
    }
}

/// Where a record's bytes are, if anywhere
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSlot {
    /// Bytes held in memory since upload
    Loaded(FileContent),
    /// Bytes existed but were not retained across a restart
    Detached,
    /// The record never carried content
    Empty,
}

impl ContentSlot {
    pub fn loaded(&self) -> Option<&FileContent> {
        match self {
            ContentSlot::Loaded(content) => Some(content),
            _ => None,
        }
    }

    pub fn marker(&self) -> ContentMarker {
        match self {
            ContentSlot::Loaded(_) | ContentSlot::Detached => ContentMarker::Hidden,
            ContentSlot::Empty => ContentMarker::Absent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub id: String,
    pub original_name: String,
    pub size: u64,
    pub media_type: String,
    pub upload_time: String,
    pub download_count: u64,
    pub content: ContentSlot,
}

impl FileRecord {
    pub fn new(id: &str, original_name: &str, media_type: Option<&str>, bytes: &[u8]) -> Self {
        let media_type = media_type
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_MEDIA_TYPE);

        Self {
            id: id.to_string(),
            original_name: original_name.to_string(),
            size: bytes.len() as u64,
            media_type: media_type.to_string(),
            upload_time: chrono::Local::now().format(UPLOAD_TIME_FORMAT).to_string(),
            download_count: 0,
            content: ContentSlot::Loaded(FileContent::encode(media_type, bytes)),
        }
    }

    pub fn uploaded_at(&self) -> Option<chrono::NaiveDateTime> {
        chrono::NaiveDateTime::parse_from_str(&self.upload_time, UPLOAD_TIME_FORMAT).ok()
    }

    pub fn has_content(&self) -> bool {
        self.content.loaded().is_some()
    }
}

/// Presence flag that replaces content in durable storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContentMarker {
    Hidden,
    Absent,
}

impl From<String> for ContentMarker {
    fn from(value: String) -> Self {
        if value.is_empty() {
            ContentMarker::Absent
        } else {
            ContentMarker::Hidden
        }
    }
}

impl From<ContentMarker> for String {
    fn from(marker: ContentMarker) -> Self {
        match marker {
            ContentMarker::Hidden => HIDDEN_CONTENT_MARKER.to_string(),
            ContentMarker::Absent => String::new(),
        }
    }
}

/// Content-free projection of a `FileRecord`, as written to durable storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedFile {
    pub id: String,
    pub original_name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub media_type: String,
    pub upload_time: String,
    pub download_count: u64,
    #[serde(rename = "dataUrl")]
    pub content: ContentMarker,
}

impl From<&FileRecord> for PersistedFile {
    fn from(record: &FileRecord) -> Self {
        Self {
            id: record.id.clone(),
            original_name: record.original_name.clone(),
            size: record.size,
            media_type: record.media_type.clone(),
            upload_time: record.upload_time.clone(),
            download_count: record.download_count,
            content: record.content.marker(),
        }
    }
}

impl From<PersistedFile> for FileRecord {
    fn from(persisted: PersistedFile) -> Self {
        let content = match persisted.content {
            ContentMarker::Hidden => ContentSlot::Detached,
            ContentMarker::Absent => ContentSlot::Empty,
        };

        Self {
            id: persisted.id,
            original_name: persisted.original_name,
            size: persisted.size,
            media_type: persisted.media_type,
            upload_time: persisted.upload_time,
            download_count: persisted.download_count,
            content,
        }
    }
}

/// Formats a byte count as e.g. `2 KB` or `1.5 MB`
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}
