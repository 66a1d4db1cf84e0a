pub mod file;
pub mod token;

pub use file::{
    human_size, ContentError, ContentMarker, ContentSlot, FileContent, FileRecord, PersistedFile,
    DEFAULT_MEDIA_TYPE,
};
pub use token::{generate_token, generate_unique_token};
