use thiserror::Error;

/// Failures talking to the survey backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid backend url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[cfg(feature = "http")]
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },
    #[error("unexpected response body from {url}: {reason}")]
    Decode { url: String, reason: String },
    #[error("backend rejected the request: {0}")]
    Rejected(String),
}

/// Errors returned by the respondent runtime's network operations.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("a {0} request is already in flight")]
    Busy(&'static str),
    #[error("required questions are not complete")]
    Incomplete,
    #[error("no survey is loaded")]
    NotInitialized,
    #[error("survey has no page {0}")]
    PageOutOfRange(usize),
    #[error(transparent)]
    Api(#[from] ApiError),
}
