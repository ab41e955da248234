//! State machines for authoring and answering tracer study surveys.
//!
//! [`SurveyBuilder`] edits a package of versioned questions spread over pages.
//! [`RespondentRuntime`] walks a respondent through one page, resolving
//! conditional questions and mirroring progress through a [`DraftPersistence`]
//! sink. [`SurveyApi`] abstracts the backend; [`HttpSurveyApi`] talks to it
//! over HTTP.

pub mod api;
pub mod autosave;
pub mod builder;
pub mod error;
pub mod respondent;

#[cfg(feature = "http")]
pub use api::HttpSurveyApi;
pub use api::{ReportExporter, ReportFilters, ReportFormat, SurveyApi};
pub use autosave::{AutosavePolicy, DraftBundle, DraftPersistence};
pub use builder::{IntegrityIssue, PageMetaPatch, SurveyBuilder};
pub use error::{ApiError, RuntimeError};
pub use respondent::{GENERAL_ERROR_KEY, RespondentRuntime, RespondentState, SurveyInit};
