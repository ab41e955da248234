use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::answers::{AnswerMap, AnswerValue};
use crate::spec::question::{Question, QuestionId};

/// A follow-up question shown exactly when the trigger question's answer
/// equals `trigger_option_value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalQuestion {
    pub id: String,
    pub trigger_question_id: QuestionId,
    pub trigger_option_value: String,
    pub question: Question,
}

impl ConditionalQuestion {
    /// Strict scalar equality. Multi-select answers never trigger.
    pub fn is_triggered_by(&self, answers: &AnswerMap) -> bool {
        matches!(
            answers.get(&self.trigger_question_id),
            Some(AnswerValue::Text(value)) if *value == self.trigger_option_value
        )
    }
}

/// Conditionals whose trigger currently matches, in declaration order.
pub fn visible_conditionals<'a>(
    conditionals: &'a [ConditionalQuestion],
    answers: &AnswerMap,
) -> Vec<&'a ConditionalQuestion> {
    conditionals
        .iter()
        .filter(|conditional| conditional.is_triggered_by(answers))
        .collect()
}

/// Splices visible conditionals right after their trigger question.
/// Conditionals on the same trigger keep their relative order; conditionals
/// whose trigger is not part of `base` are left out.
pub fn flatten_visible_questions(
    base: &[Question],
    visible: &[&ConditionalQuestion],
) -> Vec<Question> {
    let base_ids: BTreeSet<&str> = base.iter().map(|question| question.id.as_str()).collect();
    let mut flattened = Vec::with_capacity(base.len() + visible.len());

    for question in base {
        flattened.push(question.clone());
        flattened.extend(
            visible
                .iter()
                .filter(|conditional| conditional.trigger_question_id == question.id)
                .filter(|conditional| !base_ids.contains(conditional.question.id.as_str()))
                .map(|conditional| conditional.question.clone()),
        );
    }

    flattened
}

/// Drops answers recorded against conditional questions that were visible
/// before and are hidden now.
pub fn reconcile_stale_answers(
    previous: &[&ConditionalQuestion],
    current: &[&ConditionalQuestion],
    answers: &AnswerMap,
) -> AnswerMap {
    let mut reconciled = answers.clone();
    for key in stale_answer_keys(previous, current) {
        reconciled.remove(&key);
    }
    reconciled
}

/// Answer keys owned by conditionals that stopped being visible.
pub fn stale_answer_keys(
    previous: &[&ConditionalQuestion],
    current: &[&ConditionalQuestion],
) -> Vec<String> {
    let still_visible: BTreeSet<&str> = current
        .iter()
        .map(|conditional| conditional.id.as_str())
        .collect();

    previous
        .iter()
        .filter(|conditional| !still_visible.contains(conditional.id.as_str()))
        .flat_map(|conditional| {
            let mut keys: Vec<String> = conditional
                .question
                .answer_keys()
                .into_iter()
                .map(str::to_string)
                .collect();
            if !keys.contains(&conditional.question.id) {
                keys.push(conditional.question.id.clone());
            }
            keys
        })
        .collect()
}
