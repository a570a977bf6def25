//! Error types for BADEA ingestion.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Cache Errors ===
    /// A cached response exists but cannot be decoded.
    #[error("cached response {path} is unreadable: {source}")]
    CorruptCache {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // === Network Errors ===
    #[error("request to {url} failed: {message}")]
    Fetch { url: String, message: String },

    #[error("request to {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("response from {url} does not match the expected shape: {message}")]
    InvalidResponse { url: String, message: String },

    // === Serialization Errors ===
    #[error("failed to serialize {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // === Table Errors ===
    #[error("failed to parse table {path}: {message}")]
    TableParse { path: PathBuf, message: String },

    #[error("failed to write table {path}: {message}")]
    TableWrite { path: PathBuf, message: String },

    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for IngestError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
