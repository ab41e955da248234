use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::answers::{AnswerMap, OtherValues};
use crate::spec::question::Question;
use crate::validate::{is_answered, is_complete};

/// Position of the respondent inside the visible question list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
    pub percentage: u32,
}

impl Progress {
    /// `current_index` is zero based; `current` is reported one based.
    pub fn at(current_index: usize, total: usize) -> Self {
        if total == 0 {
            return Self {
                current: 0,
                total: 0,
                percentage: 0,
            };
        }
        let current = (current_index + 1).min(total);
        let percentage = ((current as f64 / total as f64) * 100.0).round() as u32;
        Self {
            current,
            total,
            percentage,
        }
    }
}

/// Number of questions that satisfy the answered predicate.
pub fn answered_count(questions: &[Question], answers: &AnswerMap) -> usize {
    questions
        .iter()
        .filter(|question| is_answered(question, answers))
        .count()
}

/// Every required, enabled question is complete. `answered_count` stays on
/// the looser answered predicate.
pub fn can_submit(questions: &[Question], answers: &AnswerMap, other_values: &OtherValues) -> bool {
    questions
        .iter()
        .filter(|question| question.required && !question.disabled)
        .all(|question| is_complete(question, answers, other_values))
}
