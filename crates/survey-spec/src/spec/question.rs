use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SpecError;

/// Identifier of a question, combobox item or rating item.
pub type QuestionId = String;

pub(crate) fn is_false(value: &bool) -> bool {
    !*value
}

/// Generates a fresh question id.
pub fn new_question_id() -> QuestionId {
    format!("q_{}", Uuid::new_v4().simple())
}

/// Discriminant of the question union.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Text,
    Single,
    Multiple,
    Combobox,
    Rating,
}

impl QuestionType {
    pub const ALL: [QuestionType; 5] = [
        QuestionType::Text,
        QuestionType::Single,
        QuestionType::Multiple,
        QuestionType::Combobox,
        QuestionType::Rating,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::Text => "text",
            QuestionType::Single => "single",
            QuestionType::Multiple => "multiple",
            QuestionType::Combobox => "combobox",
            QuestionType::Rating => "rating",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = SpecError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        QuestionType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == raw.trim())
            .ok_or_else(|| SpecError::UnknownQuestionType(raw.to_string()))
    }
}

/// HTML input flavour for text questions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    #[default]
    Text,
    Email,
    Number,
    Tel,
    Url,
}

/// Layout of choice options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChoiceLayout {
    #[default]
    Vertical,
    Horizontal,
}

/// One selectable option. `is_other` marks the write-in option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceOption {
    pub value: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_other: bool,
}

impl ChoiceOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            disabled: false,
            is_other: false,
        }
    }

    pub fn other(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            is_other: true,
            ..Self::new(value, label)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TextSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub input_type: InputType,
}

/// Shared body of `single` and `multiple` questions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceSpec {
    #[serde(default)]
    pub options: Vec<ChoiceOption>,
    #[serde(default)]
    pub layout: ChoiceLayout,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_input_placeholder: Option<String>,
    #[serde(default)]
    pub validate_other: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// A single drop-down inside a combobox question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComboboxItem {
    pub id: QuestionId,
    pub label: String,
    #[serde(default)]
    pub options: Vec<ChoiceOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComboboxSpec {
    #[serde(default)]
    pub combobox_items: Vec<ComboboxItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingItem {
    pub id: QuestionId,
    pub label: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RatingOption {
    pub value: String,
    pub label: String,
}

/// The default five point verbal scale.
pub fn default_rating_options() -> Vec<RatingOption> {
    [
        ("1", "Sangat Kurang"),
        ("2", "Kurang"),
        ("3", "Cukup"),
        ("4", "Baik"),
        ("5", "Sangat Baik"),
    ]
    .into_iter()
    .map(|(value, label)| RatingOption {
        value: value.into(),
        label: label.into(),
    })
    .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingSpec {
    #[serde(default)]
    pub rating_items: Vec<RatingItem>,
    #[serde(default = "default_rating_options")]
    pub rating_options: Vec<RatingOption>,
}

impl Default for RatingSpec {
    fn default() -> Self {
        Self {
            rating_items: Vec::new(),
            rating_options: default_rating_options(),
        }
    }
}

/// Variant-specific body of a question, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum QuestionKind {
    Text(TextSpec),
    Single(ChoiceSpec),
    Multiple(ChoiceSpec),
    Combobox(ComboboxSpec),
    Rating(RatingSpec),
}

impl QuestionKind {
    pub fn question_type(&self) -> QuestionType {
        match self {
            QuestionKind::Text(_) => QuestionType::Text,
            QuestionKind::Single(_) => QuestionType::Single,
            QuestionKind::Multiple(_) => QuestionType::Multiple,
            QuestionKind::Combobox(_) => QuestionType::Combobox,
            QuestionKind::Rating(_) => QuestionType::Rating,
        }
    }

    /// Minimal renderable body for a freshly added question.
    pub fn placeholder(question_type: QuestionType) -> Self {
        let two_options = || {
            vec![
                ChoiceOption::new("opsi-1", "Opsi 1"),
                ChoiceOption::new("opsi-2", "Opsi 2"),
            ]
        };
        match question_type {
            QuestionType::Text => QuestionKind::Text(TextSpec {
                placeholder: Some("Tulis jawaban Anda".into()),
                input_type: InputType::Text,
            }),
            QuestionType::Single => QuestionKind::Single(ChoiceSpec {
                options: two_options(),
                ..ChoiceSpec::default()
            }),
            QuestionType::Multiple => QuestionKind::Multiple(ChoiceSpec {
                options: two_options(),
                ..ChoiceSpec::default()
            }),
            QuestionType::Combobox => QuestionKind::Combobox(ComboboxSpec {
                combobox_items: vec![ComboboxItem {
                    id: new_question_id(),
                    label: "Pilihan 1".into(),
                    options: two_options(),
                    required: None,
                    disabled: false,
                }],
            }),
            QuestionType::Rating => QuestionKind::Rating(RatingSpec {
                rating_items: vec![RatingItem {
                    id: new_question_id(),
                    label: "Aspek 1".into(),
                    disabled: false,
                }],
                rating_options: default_rating_options(),
            }),
        }
    }
}

/// A survey question: common fields plus a typed body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,
    #[serde(flatten)]
    pub kind: QuestionKind,
}

/// Invariant violation found by [`Question::check`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionIssue {
    pub question_id: QuestionId,
    pub message: String,
}

impl Question {
    pub fn new(id: impl Into<QuestionId>, label: impl Into<String>, kind: QuestionKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            required: false,
            disabled: false,
            kind,
        }
    }

    /// Builds the starting point used whenever a question is added in the builder.
    pub fn default_for(question_type: QuestionType) -> Self {
        Self::new(
            new_question_id(),
            "Pertanyaan baru",
            QuestionKind::placeholder(question_type),
        )
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn question_type(&self) -> QuestionType {
        self.kind.question_type()
    }

    /// Choice options for `single` and `multiple` questions.
    pub fn choice(&self) -> Option<&ChoiceSpec> {
        match &self.kind {
            QuestionKind::Single(choice) | QuestionKind::Multiple(choice) => Some(choice),
            _ => None,
        }
    }

    pub fn other_option(&self) -> Option<&ChoiceOption> {
        self.choice()
            .and_then(|choice| choice.options.iter().find(|option| option.is_other))
    }

    /// Keys this question writes into the answer map.
    pub fn answer_keys(&self) -> Vec<&str> {
        match &self.kind {
            QuestionKind::Combobox(spec) => spec
                .combobox_items
                .iter()
                .map(|item| item.id.as_str())
                .collect(),
            QuestionKind::Rating(spec) => spec
                .rating_items
                .iter()
                .map(|item| item.id.as_str())
                .collect(),
            _ => vec![self.id.as_str()],
        }
    }

    pub fn check(&self) -> Vec<QuestionIssue> {
        let mut issues = Vec::new();
        let mut issue = |message: String| {
            issues.push(QuestionIssue {
                question_id: self.id.clone(),
                message,
            })
        };

        match &self.kind {
            QuestionKind::Text(_) => {}
            QuestionKind::Single(choice) | QuestionKind::Multiple(choice) => {
                for value in duplicates(choice.options.iter().map(|option| option.value.as_str())) {
                    issue(format!("duplicate option value '{value}'"));
                }
                let others = choice.options.iter().filter(|option| option.is_other).count();
                if others > 1 {
                    issue(format!("{others} options are marked as other"));
                }
            }
            QuestionKind::Combobox(spec) => {
                for id in duplicates(spec.combobox_items.iter().map(|item| item.id.as_str())) {
                    issue(format!("duplicate combobox item id '{id}'"));
                }
                for item in &spec.combobox_items {
                    for value in duplicates(item.options.iter().map(|option| option.value.as_str()))
                    {
                        issue(format!(
                            "duplicate option value '{value}' in combobox item '{}'",
                            item.id
                        ));
                    }
                }
            }
            QuestionKind::Rating(spec) => {
                for id in duplicates(spec.rating_items.iter().map(|item| item.id.as_str())) {
                    issue(format!("duplicate rating item id '{id}'"));
                }
                for value in duplicates(spec.rating_options.iter().map(|option| option.value.as_str()))
                {
                    issue(format!("duplicate rating option value '{value}'"));
                }
            }
        }

        issues
    }
}

fn duplicates<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = BTreeSet::new();
    let mut repeated = BTreeSet::new();
    for value in values {
        if !seen.insert(value) {
            repeated.insert(value);
        }
    }
    repeated.into_iter().collect()
}
