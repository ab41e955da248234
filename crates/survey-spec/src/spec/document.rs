use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::conditional::ConditionalQuestion;
use crate::error::SpecError;
use crate::spec::builder::{BuilderQuestion, Page};
use crate::spec::question::Question;

/// A survey package as exchanged with the backend: the question pool, the
/// pages that reference it and any standalone conditional declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SurveyDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub questions: Vec<BuilderQuestion>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pages: Vec<Page>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditionals: Vec<ConditionalQuestion>,
}

/// What a respondent sees for one page before conditional resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    pub index: usize,
    pub page_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub questions: Vec<Question>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditionals: Vec<ConditionalQuestion>,
}

impl SurveyDocument {
    pub fn from_json(raw: &str) -> Result<Self, SpecError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, SpecError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Pages as declared, or [`Page::implicit`] over the questions in `order`
    /// when the document has none.
    pub fn effective_pages(&self) -> Vec<Page> {
        if !self.pages.is_empty() {
            return self.pages.clone();
        }
        let mut ordered: Vec<&BuilderQuestion> = self.questions.iter().collect();
        ordered.sort_by_key(|question| question.order);
        vec![Page::implicit(ordered)]
    }

    pub fn page_count(&self) -> usize {
        self.effective_pages().len()
    }

    /// Slices one page. Child questions that name a parent and trigger value
    /// become conditionals; document-level conditionals attach when their
    /// trigger lives on this page.
    pub fn page_view(&self, index: usize) -> Option<PageView> {
        let pages = self.effective_pages();
        let page = pages.get(index)?;
        let pool: BTreeMap<&str, &BuilderQuestion> = self
            .questions
            .iter()
            .map(|question| (question.id(), question))
            .collect();

        let mut questions = Vec::new();
        let mut conditionals = Vec::new();
        for id in &page.question_ids {
            let Some(entry) = pool.get(id.as_str()) else {
                continue;
            };
            match (&entry.parent_id, &entry.trigger_option_value) {
                (Some(parent), Some(trigger)) => conditionals.push(ConditionalQuestion {
                    id: entry.id().to_string(),
                    trigger_question_id: parent.clone(),
                    trigger_option_value: trigger.clone(),
                    question: entry.question.clone(),
                }),
                _ => questions.push(entry.question.clone()),
            }
        }

        conditionals.extend(
            self.conditionals
                .iter()
                .filter(|conditional| {
                    questions
                        .iter()
                        .any(|question| question.id == conditional.trigger_question_id)
                })
                .cloned(),
        );

        Some(PageView {
            index,
            page_id: page.id.clone(),
            title: page.title.clone(),
            description: page.description.clone(),
            questions,
            conditionals,
        })
    }
}
