use thiserror::Error;

/// Errors raised while reading survey definitions.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown question type '{0}'")]
    UnknownQuestionType(String),
}
