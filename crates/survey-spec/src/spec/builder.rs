use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::spec::question::{Question, QuestionId, QuestionKind};

/// Lifecycle of a question inside the builder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum QuestionStatus {
    New,
    Edited,
    #[default]
    Saved,
}

/// A question as authored in the builder: the question itself plus pool
/// position, lifecycle and version/parent linkage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuilderQuestion {
    #[serde(flatten)]
    pub question: Question,
    #[serde(default)]
    pub order: usize,
    #[serde(default)]
    pub status: QuestionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<QuestionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_question_id: Option<QuestionId>,
    /// Parent option value that reveals this question to respondents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_option_value: Option<String>,
}

impl BuilderQuestion {
    pub fn new(question: Question) -> Self {
        Self {
            question,
            order: 0,
            status: QuestionStatus::New,
            question_code: None,
            version: None,
            parent_id: None,
            group_question_id: None,
            trigger_option_value: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.question.id
    }

    pub fn is_child(&self) -> bool {
        self.parent_id.is_some()
    }

    /// Shared logical identity with other versions of the same question.
    pub fn same_code(&self, other: &BuilderQuestion) -> bool {
        matches!(
            (&self.question_code, &other.question_code),
            (Some(left), Some(right)) if left == right
        )
    }

    /// Merges a patch. New questions stay new until saved.
    pub fn apply_patch(&mut self, patch: QuestionPatch) {
        let QuestionPatch {
            label,
            required,
            disabled,
            kind,
            question_code,
            version,
            parent_id,
            group_question_id,
            trigger_option_value,
        } = patch;

        if let Some(label) = label {
            self.question.label = label;
        }
        if let Some(required) = required {
            self.question.required = required;
        }
        if let Some(disabled) = disabled {
            self.question.disabled = disabled;
        }
        if let Some(kind) = kind {
            self.question.kind = kind;
        }
        if question_code.is_some() {
            self.question_code = question_code;
        }
        if version.is_some() {
            self.version = version;
        }
        if parent_id.is_some() {
            self.parent_id = parent_id;
        }
        if group_question_id.is_some() {
            self.group_question_id = group_question_id;
        }
        if trigger_option_value.is_some() {
            self.trigger_option_value = trigger_option_value;
        }

        if self.status != QuestionStatus::New {
            self.status = QuestionStatus::Edited;
        }
    }
}

/// Partial update for a builder question. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct QuestionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<QuestionKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<QuestionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_question_id: Option<QuestionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_option_value: Option<String>,
}

/// Overrides applied on top of the factory question when the builder creates
/// a child question.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionSeed {
    pub id: Option<QuestionId>,
    pub label: Option<String>,
    pub required: Option<bool>,
    pub kind: Option<QuestionKind>,
    pub question_code: Option<String>,
    pub version: Option<String>,
    pub group_question_id: Option<QuestionId>,
    pub trigger_option_value: Option<String>,
}

/// One page of a survey package. Pages only reference questions by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub question_ids: Vec<QuestionId>,
}

/// Id of the page synthesized for packages without pages.
pub const IMPLICIT_PAGE_ID: &str = "page-1";

impl Page {
    /// Empty page titled after its 1-based position.
    pub fn numbered(position: usize) -> Self {
        Self {
            id: format!("page_{}", Uuid::new_v4().simple()),
            title: Some(format!("Halaman {position}")),
            description: None,
            question_ids: Vec::new(),
        }
    }

    /// The one page used when a package declares none: every top-level
    /// question, in the order given.
    pub fn implicit<'a>(questions: impl IntoIterator<Item = &'a BuilderQuestion>) -> Self {
        let mut page = Self::numbered(1);
        page.id = IMPLICIT_PAGE_ID.into();
        page.question_ids = questions
            .into_iter()
            .filter(|question| !question.is_child())
            .map(|question| question.id().to_string())
            .collect();
        page
    }

    pub fn contains(&self, question_id: &str) -> bool {
        self.question_ids.iter().any(|id| id == question_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PackageMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_package_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

fn default_package_version() -> String {
    "1.0.0".into()
}

impl Default for PackageMeta {
    fn default() -> Self {
        Self {
            id: None,
            name: None,
            description: None,
            version: default_package_version(),
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PackageMetaPatch {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub updated_at: Option<String>,
}

impl PackageMeta {
    pub fn merge(&mut self, patch: PackageMetaPatch) {
        if patch.id.is_some() {
            self.id = patch.id;
        }
        if patch.name.is_some() {
            self.name = patch.name;
        }
        if patch.description.is_some() {
            self.description = patch.description;
        }
        if let Some(version) = patch.version {
            self.version = version;
        }
        if patch.updated_at.is_some() {
            self.updated_at = patch.updated_at;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::question::QuestionType;

    #[test]
    fn patch_keeps_new_status_and_marks_saved_as_edited() {
        let mut fresh = BuilderQuestion::new(Question::default_for(QuestionType::Text));
        fresh.apply_patch(QuestionPatch {
            label: Some("Nama lengkap".into()),
            ..QuestionPatch::default()
        });
        assert_eq!(fresh.status, QuestionStatus::New);
        assert_eq!(fresh.question.label, "Nama lengkap");

        fresh.status = QuestionStatus::Saved;
        fresh.apply_patch(QuestionPatch {
            required: Some(true),
            ..QuestionPatch::default()
        });
        assert_eq!(fresh.status, QuestionStatus::Edited);
        assert!(fresh.question.required);
    }

    #[test]
    fn backend_question_defaults_to_saved() {
        let parsed: BuilderQuestion = serde_json::from_value(serde_json::json!({
            "id": "q1",
            "type": "text",
            "label": "Nama",
            "className": "ignored"
        }))
        .expect("builder question parses");
        assert_eq!(parsed.status, QuestionStatus::Saved);
        assert_eq!(parsed.order, 0);
        assert_eq!(parsed.question.question_type(), QuestionType::Text);
    }
}
