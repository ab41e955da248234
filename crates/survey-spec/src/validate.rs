use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::answers::{AnswerMap, AnswerValue, OtherValues};
use crate::spec::question::{ChoiceSpec, InputType, Question, QuestionKind};

/// Per-question validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub question_id: String,
    pub message: String,
    pub code: String,
}

/// Outcome of validating a set of questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ValidationError>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_required: Vec<String>,
}

/// Answered predicate shared by progress counting, submit gating and validation.
///
/// Rating questions need every enabled item rated, combobox questions need
/// every required enabled item selected, everything else needs a non-blank value.
pub fn is_answered(question: &Question, answers: &AnswerMap) -> bool {
    let filled = |key: &str| answers.get(key).is_some_and(AnswerValue::is_filled);

    match &question.kind {
        QuestionKind::Text(_) | QuestionKind::Single(_) | QuestionKind::Multiple(_) => {
            filled(&question.id)
        }
        QuestionKind::Combobox(spec) => {
            let enabled: Vec<_> = spec
                .combobox_items
                .iter()
                .filter(|item| !item.disabled)
                .collect();
            let required: Vec<_> = enabled
                .iter()
                .filter(|item| item.required.unwrap_or(true))
                .collect();
            if required.is_empty() {
                enabled.iter().any(|item| filled(&item.id))
            } else {
                required.iter().all(|item| filled(&item.id))
            }
        }
        QuestionKind::Rating(spec) => {
            let mut enabled = spec.rating_items.iter().filter(|item| !item.disabled).peekable();
            enabled.peek().is_some() && enabled.all(|item| filled(&item.id))
        }
    }
}

/// Answered, and when the selected option is an "other" choice that demands
/// text, that text is written. Gates submission and forward navigation.
pub fn is_complete(question: &Question, answers: &AnswerMap, other_values: &OtherValues) -> bool {
    if !is_answered(question, answers) {
        return false;
    }
    match &question.kind {
        QuestionKind::Single(choice) | QuestionKind::Multiple(choice) => answers
            .get(&question.id)
            .is_none_or(|value| check_other(question, choice, value, other_values).is_none()),
        QuestionKind::Text(_) | QuestionKind::Combobox(_) | QuestionKind::Rating(_) => true,
    }
}

/// Validates one question against the current answers.
pub fn validate_question(
    question: &Question,
    answers: &AnswerMap,
    other_values: &OtherValues,
) -> Option<ValidationError> {
    if question.disabled {
        return None;
    }

    if question.required && !is_answered(question, answers) {
        let (message, code) = match &question.kind {
            QuestionKind::Rating(_) => ("Please rate every item", "rating_incomplete"),
            QuestionKind::Combobox(_) => ("Please complete every selection", "combobox_incomplete"),
            _ => ("This question is required", "required"),
        };
        return Some(error(question, message, code));
    }

    match &question.kind {
        QuestionKind::Text(spec) => answers
            .get(&question.id)
            .and_then(AnswerValue::as_text)
            .filter(|text| !text.trim().is_empty())
            .and_then(|text| check_input_type(question, spec.input_type, text.trim())),
        QuestionKind::Single(choice) | QuestionKind::Multiple(choice) => {
            let value = answers.get(&question.id)?;
            check_options(question, choice, value)
                .or_else(|| check_other(question, choice, value, other_values))
        }
        QuestionKind::Combobox(_) | QuestionKind::Rating(_) => None,
    }
}

/// Validates every question in order; the list is the effective (flattened) set.
pub fn validate_questions(
    questions: &[Question],
    answers: &AnswerMap,
    other_values: &OtherValues,
) -> ValidationResult {
    let mut errors = Vec::new();
    let mut missing_required = Vec::new();

    for question in questions {
        if let Some(found) = validate_question(question, answers, other_values) {
            if question.required && !is_answered(question, answers) {
                missing_required.push(question.id.clone());
            }
            errors.push(found);
        }
    }

    ValidationResult {
        valid: errors.is_empty(),
        errors,
        missing_required,
    }
}

fn check_options(
    question: &Question,
    choice: &ChoiceSpec,
    value: &AnswerValue,
) -> Option<ValidationError> {
    let known = |candidate: &str| choice.options.iter().any(|option| option.value == candidate);
    let unknown = match value {
        AnswerValue::Text(text) => !text.is_empty() && !known(text),
        AnswerValue::Many(values) => values.iter().any(|selected| !known(selected)),
    };
    unknown.then(|| error(question, "Selected option is not available", "invalid_option"))
}

fn check_other(
    question: &Question,
    choice: &ChoiceSpec,
    value: &AnswerValue,
    other_values: &OtherValues,
) -> Option<ValidationError> {
    if !choice.validate_other {
        return None;
    }
    let other = question.other_option()?;
    if !value.selects(&other.value) {
        return None;
    }
    let written = other_values
        .get(&question.id)
        .is_some_and(|text| !text.trim().is_empty());
    if written {
        return None;
    }
    let message = choice
        .error_message
        .as_deref()
        .unwrap_or("Please fill in the other answer");
    Some(error(question, message, "other_required"))
}

fn check_input_type(question: &Question, input_type: InputType, text: &str) -> Option<ValidationError> {
    let valid = match input_type {
        InputType::Text => true,
        InputType::Email => is_email(text),
        InputType::Number => text.parse::<f64>().is_ok_and(f64::is_finite),
        InputType::Tel => text.chars().any(|c| c.is_ascii_digit())
            && text
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')')),
        InputType::Url => {
            let rest = text
                .strip_prefix("https://")
                .or_else(|| text.strip_prefix("http://"));
            rest.is_some_and(|host| !host.is_empty() && !host.contains(char::is_whitespace))
        }
    };
    (!valid).then(|| error(question, "Value has an invalid format", "invalid_format"))
}

fn is_email(text: &str) -> bool {
    let Some((local, domain)) = text.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !text.contains(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

fn error(question: &Question, message: &str, code: &str) -> ValidationError {
    ValidationError {
        question_id: question.id.clone(),
        message: message.into(),
        code: code.into(),
    }
}
