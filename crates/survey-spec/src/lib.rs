#![allow(missing_docs)]

pub mod answers;
pub mod conditional;
pub mod error;
pub mod progress;
pub mod spec;
pub mod validate;

pub use answers::{
    AnswerEntry, AnswerMap, AnswerSubmission, AnswerValue, OtherValues, SubmissionReceipt,
};
pub use conditional::{
    ConditionalQuestion, flatten_visible_questions, reconcile_stale_answers, stale_answer_keys,
    visible_conditionals,
};
pub use error::SpecError;
pub use progress::{Progress, answered_count, can_submit};
pub use spec::{
    BuilderQuestion, PackageMeta, PackageMetaPatch, Page, PageView, Question, QuestionId,
    QuestionKind, QuestionPatch, QuestionSeed, QuestionStatus, QuestionType, SurveyDocument,
};
pub use validate::{
    ValidationError, ValidationResult, is_answered, is_complete, validate_question,
    validate_questions,
};

/// JSON Schema of the survey package document.
pub fn document_schema() -> schemars::Schema {
    schemars::schema_for!(SurveyDocument)
}
