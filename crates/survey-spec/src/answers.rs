use std::collections::{BTreeMap, BTreeSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::question::{Question, QuestionKind};

/// A stored answer: a single string (text, single choice, combobox item,
/// rating item) or a set of selected values (multiple choice).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    Many(Vec<String>),
}

impl AnswerValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(text) => Some(text),
            AnswerValue::Many(_) => None,
        }
    }

    pub fn as_many(&self) -> Option<&[String]> {
        match self {
            AnswerValue::Many(values) => Some(values),
            AnswerValue::Text(_) => None,
        }
    }

    /// Non-blank text or at least one selection.
    pub fn is_filled(&self) -> bool {
        match self {
            AnswerValue::Text(text) => !text.trim().is_empty(),
            AnswerValue::Many(values) => !values.is_empty(),
        }
    }

    /// Whether `value` is the selected value (single) or among the selections (multiple).
    pub fn selects(&self, value: &str) -> bool {
        match self {
            AnswerValue::Text(text) => text == value,
            AnswerValue::Many(values) => values.iter().any(|selected| selected == value),
        }
    }

    /// Builds a multi-select answer, dropping duplicates but keeping first-seen order.
    pub fn many<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = BTreeSet::new();
        AnswerValue::Many(
            values
                .into_iter()
                .map(Into::into)
                .filter(|value: &String| seen.insert(value.clone()))
                .collect(),
        )
    }

    fn option_ids(&self) -> Vec<String> {
        match self {
            AnswerValue::Text(text) => vec![text.clone()],
            AnswerValue::Many(values) => values.clone(),
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Text(value.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(value: String) -> Self {
        AnswerValue::Text(value)
    }
}

impl From<Vec<String>> for AnswerValue {
    fn from(values: Vec<String>) -> Self {
        AnswerValue::many(values)
    }
}

/// Answers keyed by question id (or combobox/rating item id).
pub type AnswerMap = BTreeMap<String, AnswerValue>;

/// Free text typed next to an "other" option, keyed by question id.
pub type OtherValues = BTreeMap<String, String>;

/// One entry of the draft/submit payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEntry {
    pub question_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_option_ids: Option<Vec<String>>,
}

/// Body of the draft-save and submit requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSubmission {
    pub survey_id: String,
    pub answers: Vec<AnswerEntry>,
}

/// Backend acknowledgement of a submitted response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub id: String,
    pub survey_id: String,
    pub respondent_id: String,
    pub submitted_at: String,
}

impl AnswerSubmission {
    /// Serializes the answer map. Known questions decide between text and
    /// option ids; keys that belong to no listed question (answers from other
    /// pages) fall back on the value shape.
    pub fn build(
        survey_id: impl Into<String>,
        questions: &[Question],
        answers: &AnswerMap,
        other_values: &OtherValues,
    ) -> Self {
        let mut entries = Vec::new();
        let mut covered = BTreeSet::new();

        for question in questions {
            match &question.kind {
                QuestionKind::Text(_) => {
                    if let Some(value) = answers.get(&question.id) {
                        covered.insert(question.id.clone());
                        entries.push(entry_from_shape(&question.id, value));
                    }
                }
                QuestionKind::Single(choice) | QuestionKind::Multiple(choice) => {
                    let Some(value) = answers.get(&question.id) else {
                        continue;
                    };
                    covered.insert(question.id.clone());
                    let other_selected = choice
                        .options
                        .iter()
                        .any(|option| option.is_other && value.selects(&option.value));
                    let answer_text = other_selected
                        .then(|| other_values.get(&question.id))
                        .flatten()
                        .filter(|text| !text.trim().is_empty())
                        .cloned();
                    entries.push(AnswerEntry {
                        question_id: question.id.clone(),
                        answer_text,
                        answer_option_ids: Some(value.option_ids()),
                    });
                }
                QuestionKind::Combobox(_) | QuestionKind::Rating(_) => {
                    for key in question.answer_keys() {
                        if let Some(value) = answers.get(key) {
                            covered.insert(key.to_string());
                            entries.push(AnswerEntry {
                                question_id: key.to_string(),
                                answer_text: None,
                                answer_option_ids: Some(value.option_ids()),
                            });
                        }
                    }
                }
            }
        }

        for (key, value) in answers {
            if !covered.contains(key) {
                entries.push(entry_from_shape(key, value));
            }
        }

        Self {
            survey_id: survey_id.into(),
            answers: entries,
        }
    }
}

fn entry_from_shape(key: &str, value: &AnswerValue) -> AnswerEntry {
    match value {
        AnswerValue::Text(text) => AnswerEntry {
            question_id: key.to_string(),
            answer_text: Some(text.clone()),
            answer_option_ids: None,
        },
        AnswerValue::Many(values) => AnswerEntry {
            question_id: key.to_string(),
            answer_text: None,
            answer_option_ids: Some(values.clone()),
        },
    }
}
