//! Local draft mirroring for the respondent runtime.

use serde::{Deserialize, Serialize};
use survey_spec::{AnswerMap, OtherValues};
use survey_store::{KeyValueStore, StoreError, UserDraftStore};

/// When the runtime mirrors in-progress answers to local persistence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutosavePolicy {
    /// After every answer, other-text or completion change.
    #[default]
    EveryChange,
    /// Only when [`crate::RespondentRuntime::save_local_draft`] is called.
    Manual,
}

/// In-progress respondent state as stored locally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DraftBundle {
    pub answers: AnswerMap,
    pub other_values: OtherValues,
    pub current_question_index: usize,
    pub is_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub survey_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub survey_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

/// Sink the runtime writes draft bundles into.
pub trait DraftPersistence: Send {
    fn persist(&mut self, user_id: &str, bundle: &DraftBundle) -> Result<(), StoreError>;
    /// Bundle stored for `user_id`; `None` when absent or unreadable.
    fn restore(&self, user_id: &str) -> Option<DraftBundle>;
    fn discard(&mut self, user_id: &str) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + Send> DraftPersistence for UserDraftStore<S> {
    fn persist(&mut self, user_id: &str, bundle: &DraftBundle) -> Result<(), StoreError> {
        self.save(user_id, bundle)
    }

    fn restore(&self, user_id: &str) -> Option<DraftBundle> {
        self.load_as(user_id)
    }

    fn discard(&mut self, user_id: &str) -> Result<(), StoreError> {
        self.clear(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use survey_store::MemoryStore;

    #[test]
    fn bundle_round_trips_through_draft_store() {
        let mut store = UserDraftStore::new(MemoryStore::new(), "kunci");
        let mut bundle = DraftBundle {
            current_question_index: 2,
            survey_id: Some("tracer-2026".into()),
            ..DraftBundle::default()
        };
        bundle.answers.insert("q1".into(), "Budi".into());
        store.persist("TS_001", &bundle).expect("persist");

        let restored = store.restore("TS_001").expect("restore");
        assert_eq!(restored.answers, bundle.answers);
        assert_eq!(restored.current_question_index, 2);
        assert_eq!(restored.user_id.as_deref(), Some("TS_001"));
        assert!(restored.last_updated.is_some());

        store.discard("TS_001").expect("discard");
        assert!(store.restore("TS_001").is_none());
    }
}
