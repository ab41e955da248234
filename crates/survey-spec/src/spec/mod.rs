pub mod builder;
pub mod document;
pub mod question;

pub use builder::{
    BuilderQuestion, PackageMeta, PackageMetaPatch, Page, QuestionPatch, QuestionSeed,
    QuestionStatus,
};
pub use document::{PageView, SurveyDocument};
pub use question::{
    ChoiceLayout, ChoiceOption, ChoiceSpec, ComboboxItem, ComboboxSpec, InputType, Question,
    QuestionId, QuestionIssue, QuestionKind, QuestionType, RatingItem, RatingOption, RatingSpec,
    TextSpec, default_rating_options, new_question_id,
};
