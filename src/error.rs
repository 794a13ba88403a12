use std::path::PathBuf;

use thiserror::Error;

/// Central error type for the stem-splitter-server crate.
#[derive(Debug, Error)]
pub enum ServiceError {
    // Generic fallback (wraps anyhow)
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),

    // Request shape
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Upload failed for {filename}: {source}")]
    Upload {
        filename: String,
        source: std::io::Error,
    },

    // Domain-specific variants
    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Audio conversion failed: unsupported format `{0}`")]
    UnsupportedFormat(String),

    #[error("Audio conversion failed: {0}")]
    Conversion(String),

    #[error("Separation failed: {0}")]
    Separation(String),

    #[error("Separation failed - no output directory at {}", .0.display())]
    MissingOutput(PathBuf),

    #[error("Mastering failed: {0}")]
    Mastering(String),

    #[error("File not found")]
    NotFound,

    #[error("Cleanup failed for job {job_id}: {source}")]
    Cleanup {
        job_id: String,
        source: std::io::Error,
    },
}

// --- Implement From conversions for common errors ---
impl From<std::io::Error> for ServiceError {
    fn from(e: std::io::Error) -> Self {
        ServiceError::Anyhow(e.into())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        ServiceError::Anyhow(e.into())
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
