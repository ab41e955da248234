//! Respondent-side runtime: drives one page of questions, resolves
//! conditionals, validates and mirrors progress to local persistence.

use std::collections::BTreeMap;

use serde::Serialize;
use survey_spec::{
    AnswerMap, AnswerSubmission, AnswerValue, ConditionalQuestion, OtherValues, Progress, Question,
    SubmissionReceipt, answered_count, can_submit, flatten_visible_questions, is_complete,
    stale_answer_keys, validate_questions, visible_conditionals,
};
use tracing::{debug, warn};

use crate::api::SurveyApi;
use crate::autosave::{AutosavePolicy, DraftBundle, DraftPersistence};
use crate::error::RuntimeError;

/// Error key used for failures that belong to no single question.
pub const GENERAL_ERROR_KEY: &str = "general";

/// Input to [`RespondentRuntime::initialize_survey`].
#[derive(Debug, Clone, Default)]
pub struct SurveyInit {
    pub questions: Vec<Question>,
    pub conditionals: Vec<ConditionalQuestion>,
    pub survey_id: String,
    pub survey_title: String,
    pub user_id: Option<String>,
    /// Keep in-memory answers instead of starting over.
    pub preserve_data: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondentState {
    pub questions: Vec<Question>,
    pub conditionals: Vec<ConditionalQuestion>,
    pub current_question_index: usize,
    pub answers: AnswerMap,
    pub other_values: OtherValues,
    pub errors: BTreeMap<String, String>,
    pub is_submitting: bool,
    pub is_loading: bool,
    pub is_completed: bool,
    pub survey_id: Option<String>,
    pub survey_title: Option<String>,
    /// Navigation hint kept for the UI. [`RespondentRuntime::can_go_next`]
    /// is the authoritative check.
    pub can_go_next: bool,
    pub can_go_previous: bool,
    pub current_user_id: Option<String>,
}

/// Single-writer respondent state machine.
pub struct RespondentRuntime {
    state: RespondentState,
    policy: AutosavePolicy,
    persistence: Option<Box<dyn DraftPersistence>>,
}

impl Default for RespondentRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RespondentRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RespondentRuntime")
            .field("state", &self.state)
            .field("policy", &self.policy)
            .field("persistence", &self.persistence.is_some())
            .finish()
    }
}

impl RespondentRuntime {
    pub fn new() -> Self {
        Self {
            state: RespondentState::default(),
            policy: AutosavePolicy::default(),
            persistence: None,
        }
    }

    pub fn with_persistence(mut self, persistence: impl DraftPersistence + 'static) -> Self {
        self.persistence = Some(Box::new(persistence));
        self
    }

    pub fn with_policy(mut self, policy: AutosavePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn state(&self) -> &RespondentState {
        &self.state
    }

    pub fn policy(&self) -> AutosavePolicy {
        self.policy
    }

    pub fn initialize_survey(&mut self, init: SurveyInit) {
        let SurveyInit {
            questions,
            conditionals,
            survey_id,
            survey_title,
            user_id,
            preserve_data,
        } = init;

        let state = &mut self.state;
        state.questions = questions;
        state.conditionals = conditionals;
        state.survey_id = Some(survey_id);
        state.survey_title = Some(survey_title);
        if user_id.is_some() {
            state.current_user_id = user_id;
        }

        if preserve_data {
            let last = self.total_questions().saturating_sub(1);
            self.state.current_question_index = self.state.current_question_index.min(last);
        } else {
            self.reset_progress();
        }
        debug!(
            survey_id = self.state.survey_id.as_deref().unwrap_or_default(),
            questions = self.state.questions.len(),
            preserve_data,
            "survey initialized"
        );
    }

    /// Restores the stored bundle of `user_id`. Returns whether one was found;
    /// without one the in-memory progress starts empty.
    pub fn load_user_data(&mut self, user_id: &str) -> bool {
        self.state.current_user_id = Some(user_id.to_string());
        let restored = self
            .persistence
            .as_ref()
            .and_then(|persistence| persistence.restore(user_id))
            .filter(|bundle| bundle.user_id.as_deref() == Some(user_id));

        let Some(bundle) = restored else {
            self.reset_progress();
            return false;
        };
        self.state.answers = bundle.answers;
        self.state.other_values = bundle.other_values;
        self.state.current_question_index = bundle.current_question_index;
        self.state.is_completed = bundle.is_completed;
        self.state.errors.clear();
        self.state.can_go_next = !self.state.answers.is_empty();
        self.state.can_go_previous = self.state.current_question_index > 0;
        debug!(user_id, answers = self.state.answers.len(), "draft restored");
        true
    }

    /// Records an answer, drops answers of conditionals it hides and autosaves.
    pub fn set_answer(&mut self, question_id: &str, value: impl Into<AnswerValue>) {
        let before: Vec<String> = self.visible_conditional_ids();
        self.state.answers.insert(question_id.to_string(), value.into());
        self.reconcile_hidden(before);
        let last = self.total_questions().saturating_sub(1);
        self.state.current_question_index = self.state.current_question_index.min(last);
        self.state.can_go_previous = self.state.current_question_index > 0;
        self.state.errors.remove(question_id);
        self.state.can_go_next = true;
        self.autosave();
    }

    pub fn set_other_value(&mut self, question_id: &str, value: impl Into<String>) {
        self.state
            .other_values
            .insert(question_id.to_string(), value.into());
        self.autosave();
    }

    /// Sets or clears one question's error without touching the others.
    pub fn set_error(&mut self, question_id: &str, error: Option<String>) {
        match error {
            Some(message) => {
                self.state.errors.insert(question_id.to_string(), message);
            }
            None => {
                self.state.errors.remove(question_id);
            }
        }
    }

    pub fn clear_errors(&mut self) {
        self.state.errors.clear();
    }

    pub fn next_question(&mut self) -> bool {
        let next = self.state.current_question_index + 1;
        if next >= self.total_questions() {
            return false;
        }
        self.state.current_question_index = next;
        self.state.can_go_next = false;
        self.state.can_go_previous = true;
        true
    }

    pub fn previous_question(&mut self) -> bool {
        let Some(previous) = self.state.current_question_index.checked_sub(1) else {
            return false;
        };
        self.state.current_question_index = previous;
        self.state.can_go_previous = previous > 0;
        true
    }

    pub fn go_to_question(&mut self, index: usize) -> bool {
        if index >= self.total_questions() {
            return false;
        }
        self.state.current_question_index = index;
        self.state.can_go_previous = index > 0;
        true
    }

    pub fn set_submitting(&mut self, submitting: bool) {
        self.state.is_submitting = submitting;
    }

    pub fn set_completed(&mut self, completed: bool) {
        if self.state.is_completed != completed {
            self.state.is_completed = completed;
            self.autosave();
        }
    }

    /// Starts the same survey over; questions and identity stay.
    pub fn reset_survey(&mut self) {
        self.reset_progress();
        self.autosave();
    }

    /// Back to the initial state, identity included.
    pub fn clear_survey(&mut self) {
        self.state = RespondentState::default();
    }

    /// Base questions with visible conditionals spliced in after their triggers.
    pub fn visible_questions(&self) -> Vec<Question> {
        let visible = visible_conditionals(&self.state.conditionals, &self.state.answers);
        flatten_visible_questions(&self.state.questions, &visible)
    }

    pub fn current_question(&self) -> Option<Question> {
        self.visible_questions()
            .into_iter()
            .nth(self.state.current_question_index)
    }

    pub fn total_questions(&self) -> usize {
        self.visible_questions().len()
    }

    pub fn progress(&self) -> Progress {
        Progress::at(self.state.current_question_index, self.total_questions())
    }

    pub fn answered_count(&self) -> usize {
        answered_count(&self.visible_questions(), &self.state.answers)
    }

    /// Every required question of the loaded set is answered, including the
    /// written text of a selected "other" option that demands one.
    pub fn can_submit(&self) -> bool {
        can_submit(
            &self.visible_questions(),
            &self.state.answers,
            &self.state.other_values,
        )
    }

    /// Checks the current question only. A required question answered on
    /// another position does not unblock it, and an earlier unmet question
    /// does not block it.
    pub fn can_go_next(&self) -> bool {
        match self.current_question() {
            Some(question) if question.required && !question.disabled => {
                is_complete(&question, &self.state.answers, &self.state.other_values)
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Validates the effective question set, replacing per-question errors.
    pub fn validate_current_page(&mut self) -> bool {
        let questions = self.visible_questions();
        let result = validate_questions(&questions, &self.state.answers, &self.state.other_values);
        for question in &questions {
            self.state.errors.remove(&question.id);
        }
        for error in result.errors {
            self.state.errors.insert(error.question_id, error.message);
        }
        result.valid
    }

    /// Draft/submit payload for the visible questions.
    pub fn to_submission(&self) -> Result<AnswerSubmission, RuntimeError> {
        let survey_id = self
            .state
            .survey_id
            .as_deref()
            .ok_or(RuntimeError::NotInitialized)?;
        Ok(AnswerSubmission::build(
            survey_id,
            &self.visible_questions(),
            &self.state.answers,
            &self.state.other_values,
        ))
    }

    pub fn bundle(&self) -> DraftBundle {
        DraftBundle {
            answers: self.state.answers.clone(),
            other_values: self.state.other_values.clone(),
            current_question_index: self.state.current_question_index,
            is_completed: self.state.is_completed,
            survey_id: self.state.survey_id.clone(),
            survey_title: self.state.survey_title.clone(),
            user_id: self.state.current_user_id.clone(),
            last_updated: None,
        }
    }

    /// Writes the current bundle regardless of policy. Failures are logged
    /// and reported as `false`.
    pub fn save_local_draft(&mut self) -> bool {
        let Some(user_id) = self.state.current_user_id.clone() else {
            return false;
        };
        let bundle = self.bundle();
        let Some(persistence) = self.persistence.as_mut() else {
            return false;
        };
        match persistence.persist(&user_id, &bundle) {
            Ok(()) => true,
            Err(err) => {
                warn!(user_id, error = %err, "failed to persist draft locally");
                false
            }
        }
    }

    /// Fetches a survey and shows one of its pages. Answers from other pages
    /// are kept.
    pub async fn load_survey<A: SurveyApi + ?Sized>(
        &mut self,
        api: &A,
        survey_id: &str,
        page: usize,
    ) -> Result<(), RuntimeError> {
        if self.state.is_loading {
            return Err(RuntimeError::Busy("load"));
        }
        let fetched = {
            let _loading = PendingFlag::raise(&mut self.state.is_loading);
            api.fetch_survey(survey_id).await
        };

        let document = match fetched {
            Ok(document) => document,
            Err(err) => {
                self.record_general(err.to_string());
                return Err(err.into());
            }
        };
        let Some(view) = document.page_view(page) else {
            let err = RuntimeError::PageOutOfRange(page);
            self.record_general(err.to_string());
            return Err(err);
        };
        self.state.errors.remove(GENERAL_ERROR_KEY);
        let preserve_data = self.state.survey_id.as_deref() == Some(survey_id);
        self.initialize_survey(SurveyInit {
            questions: view.questions,
            conditionals: view.conditionals,
            survey_id: document.id.unwrap_or_else(|| survey_id.to_string()),
            survey_title: document.title.unwrap_or_default(),
            user_id: None,
            preserve_data,
        });
        Ok(())
    }

    pub async fn save_draft<A: SurveyApi + ?Sized>(&mut self, api: &A) -> Result<(), RuntimeError> {
        if self.state.is_submitting {
            return Err(RuntimeError::Busy("submit"));
        }
        let submission = self.to_submission()?;
        let saved = {
            let _submitting = PendingFlag::raise(&mut self.state.is_submitting);
            api.save_draft(&submission).await
        };
        match saved {
            Ok(()) => {
                self.state.errors.remove(GENERAL_ERROR_KEY);
                Ok(())
            }
            Err(err) => {
                self.record_general(err.to_string());
                Err(err.into())
            }
        }
    }

    /// Sends the final answers. Success marks the survey completed; failure
    /// records the `general` error and leaves completion untouched.
    pub async fn submit_survey<A: SurveyApi + ?Sized>(
        &mut self,
        api: &A,
    ) -> Result<SubmissionReceipt, RuntimeError> {
        if self.state.is_submitting {
            return Err(RuntimeError::Busy("submit"));
        }
        if !self.can_submit() {
            self.validate_current_page();
            return Err(RuntimeError::Incomplete);
        }
        let submission = self.to_submission()?;
        let submitted = {
            let _submitting = PendingFlag::raise(&mut self.state.is_submitting);
            api.submit(&submission).await
        };
        match submitted {
            Ok(receipt) => {
                self.state.errors.remove(GENERAL_ERROR_KEY);
                debug!(receipt_id = %receipt.id, "survey submitted");
                self.set_completed(true);
                Ok(receipt)
            }
            Err(err) => {
                self.record_general(err.to_string());
                Err(err.into())
            }
        }
    }

    fn autosave(&mut self) {
        if self.policy == AutosavePolicy::EveryChange {
            self.save_local_draft();
        }
    }

    fn reset_progress(&mut self) {
        let state = &mut self.state;
        state.answers.clear();
        state.other_values.clear();
        state.errors.clear();
        state.current_question_index = 0;
        state.is_completed = false;
        state.can_go_next = false;
        state.can_go_previous = false;
    }

    fn record_general(&mut self, message: String) {
        warn!(error = %message, "survey request failed");
        self.state
            .errors
            .insert(GENERAL_ERROR_KEY.to_string(), message);
    }

    fn visible_conditional_ids(&self) -> Vec<String> {
        visible_conditionals(&self.state.conditionals, &self.state.answers)
            .into_iter()
            .map(|conditional| conditional.id.clone())
            .collect()
    }

    /// Removes answers of conditionals that were visible (ids in `before`) and
    /// are hidden now, repeating while removals hide further conditionals.
    fn reconcile_hidden(&mut self, before: Vec<String>) {
        let mut before = before;
        loop {
            let state = &mut self.state;
            let previous: Vec<&ConditionalQuestion> = state
                .conditionals
                .iter()
                .filter(|conditional| before.contains(&conditional.id))
                .collect();
            let current = visible_conditionals(&state.conditionals, &state.answers);
            let stale = stale_answer_keys(&previous, &current);
            let current_ids: Vec<String> = current
                .iter()
                .map(|conditional| conditional.id.clone())
                .collect();
            if stale.is_empty() {
                return;
            }
            for key in &stale {
                state.answers.remove(key);
                state.other_values.remove(key);
                state.errors.remove(key);
            }
            debug!(keys = ?stale, "cleared answers of hidden conditional questions");
            before = current_ids;
        }
    }
}

/// Holds a busy flag up for the lifetime of a request. The flag drops back
/// when the guard does, including when the request future is cancelled.
struct PendingFlag<'a>(&'a mut bool);

impl<'a> PendingFlag<'a> {
    fn raise(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for PendingFlag<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}
