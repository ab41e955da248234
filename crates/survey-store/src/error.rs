use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the storage layer. Reads never fail; these only surface
/// from writes and from opening a file-backed store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("draft payload must be a JSON object")]
    NotAnObject,
    #[error("failed to serialize draft payload: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to format timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
    #[error("unknown survey type '{0}'")]
    UnknownSurveyType(String),
    #[error("storage I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("storage file {path} is not a key-value document: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
