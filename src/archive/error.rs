//! Archive error types
//!
//! Both variants that reach the reader are fatal to the session.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Container bytes could not be retrieved
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Container could not be parsed into entries
    #[error("Extract error: {0}")]
    Extract(String),
}

pub type ArchiveResult<T> = std::result::Result<T, ArchiveError>;

impl From<zip::result::ZipError> for ArchiveError {
    fn from(err: zip::result::ZipError) -> Self {
        ArchiveError::Extract(err.to_string())
    }
}
