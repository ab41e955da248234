use std::future::{Future, pending};
use std::sync::Mutex;
use std::task::{Context, Waker};

use async_trait::async_trait;
use survey_runtime::{
    ApiError, GENERAL_ERROR_KEY, RespondentRuntime, RuntimeError, SurveyApi,
};
use survey_spec::{AnswerSubmission, SubmissionReceipt, SurveyDocument};

const FIXTURE: &str = include_str!("fixtures/tracer_study.json");

#[derive(Default)]
struct MockApi {
    fail_submit: bool,
    drafts: Mutex<Vec<AnswerSubmission>>,
    submissions: Mutex<Vec<AnswerSubmission>>,
}

#[async_trait]
impl SurveyApi for MockApi {
    async fn fetch_survey(&self, survey_id: &str) -> Result<SurveyDocument, ApiError> {
        if survey_id != "tracer-2026" {
            return Err(ApiError::Status {
                url: format!("surveys/{survey_id}"),
                status: 404,
            });
        }
        SurveyDocument::from_json(FIXTURE).map_err(|err| ApiError::Decode {
            url: "fixture".into(),
            reason: err.to_string(),
        })
    }

    async fn save_draft(&self, submission: &AnswerSubmission) -> Result<(), ApiError> {
        self.drafts.lock().expect("lock").push(submission.clone());
        Ok(())
    }

    async fn submit(&self, submission: &AnswerSubmission) -> Result<SubmissionReceipt, ApiError> {
        if self.fail_submit {
            return Err(ApiError::Rejected("survey already closed".into()));
        }
        self.submissions.lock().expect("lock").push(submission.clone());
        Ok(SubmissionReceipt {
            id: "resp-1".into(),
            survey_id: submission.survey_id.clone(),
            respondent_id: "TS_001".into(),
            submitted_at: "2026-10-17T08:00:00Z".into(),
        })
    }
}

/// Backend that serves the fixture but never answers anything else.
struct StalledApi;

#[async_trait]
impl SurveyApi for StalledApi {
    async fn fetch_survey(&self, survey_id: &str) -> Result<SurveyDocument, ApiError> {
        if survey_id == "tracer-2026" {
            return MockApi::default().fetch_survey(survey_id).await;
        }
        pending().await
    }

    async fn save_draft(&self, _submission: &AnswerSubmission) -> Result<(), ApiError> {
        pending().await
    }

    async fn submit(&self, _submission: &AnswerSubmission) -> Result<SubmissionReceipt, ApiError> {
        pending().await
    }
}

fn answer_first_page(runtime: &mut RespondentRuntime) {
    runtime.set_answer("q1", "Budi");
    runtime.set_answer("q2", "budi@kampus.ac.id");
    runtime.set_answer("q3", "bekerja");
}

/// Polls `future` once and drops it while still pending.
fn abandon<F: Future>(future: F) {
    let mut future = std::pin::pin!(future);
    let mut cx = Context::from_waker(Waker::noop());
    assert!(future.as_mut().poll(&mut cx).is_pending());
}

#[tokio::test]
async fn load_then_submit_marks_completion() {
    let api = MockApi::default();
    let mut runtime = RespondentRuntime::new();
    runtime
        .load_survey(&api, "tracer-2026", 0)
        .await
        .expect("load page");
    assert_eq!(runtime.total_questions(), 3);
    assert_eq!(
        runtime.state().survey_title.as_deref(),
        Some("Tracer Study Lulusan 2026")
    );
    assert!(!runtime.state().is_loading);

    answer_first_page(&mut runtime);
    assert!(runtime.can_submit());

    let receipt = runtime.submit_survey(&api).await.expect("submit");
    assert_eq!(receipt.survey_id, "tracer-2026");
    assert!(runtime.state().is_completed);
    assert!(!runtime.state().is_submitting);

    let sent = api.submissions.lock().expect("lock");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].answers.len(), 3);
}

#[tokio::test]
async fn failed_submit_records_general_error() {
    let api = MockApi {
        fail_submit: true,
        ..MockApi::default()
    };
    let mut runtime = RespondentRuntime::new();
    runtime
        .load_survey(&api, "tracer-2026", 0)
        .await
        .expect("load page");
    answer_first_page(&mut runtime);

    let err = runtime.submit_survey(&api).await.expect_err("rejected");
    assert!(matches!(err, RuntimeError::Api(ApiError::Rejected(_))));
    assert!(!runtime.state().is_completed);
    assert!(!runtime.state().is_submitting);
    assert!(
        runtime
            .state()
            .errors
            .get(GENERAL_ERROR_KEY)
            .is_some_and(|message| message.contains("already closed"))
    );
}

#[tokio::test]
async fn pending_submit_rejects_second_attempt() {
    let api = MockApi::default();
    let mut runtime = RespondentRuntime::new();
    runtime
        .load_survey(&api, "tracer-2026", 0)
        .await
        .expect("load page");
    runtime.set_submitting(true);

    let err = runtime.submit_survey(&api).await.expect_err("busy");
    assert!(matches!(err, RuntimeError::Busy(_)));
    assert!(matches!(
        runtime.save_draft(&api).await,
        Err(RuntimeError::Busy(_))
    ));
    assert!(api.submissions.lock().expect("lock").is_empty());
    assert!(!runtime.state().is_completed);
}

#[tokio::test]
async fn second_page_keeps_first_page_answers() {
    let api = MockApi::default();
    let mut runtime = RespondentRuntime::new();
    runtime
        .load_survey(&api, "tracer-2026", 0)
        .await
        .expect("page 1");
    runtime.set_answer("q1", "Budi");

    runtime
        .load_survey(&api, "tracer-2026", 1)
        .await
        .expect("page 2");
    assert_eq!(runtime.total_questions(), 4);
    assert_eq!(runtime.state().conditionals.len(), 1);
    runtime.set_answer("q10", "ya-pasti");
    runtime.set_answer("q10a", "Magister");

    runtime.save_draft(&api).await.expect("draft");
    let drafts = api.drafts.lock().expect("lock");
    let keys: Vec<&str> = drafts[0]
        .answers
        .iter()
        .map(|entry| entry.question_id.as_str())
        .collect();
    assert!(keys.contains(&"q1"));
    assert!(keys.contains(&"q10a"));
}

#[tokio::test]
async fn load_failures_surface_as_general_error() {
    let api = MockApi::default();
    let mut runtime = RespondentRuntime::new();

    let err = runtime
        .load_survey(&api, "unknown", 0)
        .await
        .expect_err("not found");
    assert!(matches!(err, RuntimeError::Api(ApiError::Status { status: 404, .. })));
    assert!(runtime.state().errors.contains_key(GENERAL_ERROR_KEY));

    let err = runtime
        .load_survey(&api, "tracer-2026", 9)
        .await
        .expect_err("no such page");
    assert!(matches!(err, RuntimeError::PageOutOfRange(9)));

    runtime
        .load_survey(&api, "tracer-2026", 0)
        .await
        .expect("recovers");
    assert!(!runtime.state().errors.contains_key(GENERAL_ERROR_KEY));
}

#[tokio::test]
async fn incomplete_answers_are_not_sent() {
    let api = MockApi::default();
    let mut runtime = RespondentRuntime::new();
    runtime
        .load_survey(&api, "tracer-2026", 0)
        .await
        .expect("load page");
    answer_first_page(&mut runtime);
    runtime.set_answer("q3", "lainnya");

    let err = runtime.submit_survey(&api).await.expect_err("incomplete");
    assert!(matches!(err, RuntimeError::Incomplete));
    assert!(runtime.state().errors.contains_key("q3"));
    assert!(!runtime.state().is_submitting);
    assert!(api.submissions.lock().expect("lock").is_empty());

    runtime.set_other_value("q3", "Relawan");
    runtime.submit_survey(&api).await.expect("complete now");
    assert_eq!(api.submissions.lock().expect("lock").len(), 1);
}

#[tokio::test]
async fn abandoned_requests_release_busy_flags() {
    let mut runtime = RespondentRuntime::new();
    runtime
        .load_survey(&StalledApi, "tracer-2026", 0)
        .await
        .expect("load page");
    answer_first_page(&mut runtime);

    abandon(runtime.submit_survey(&StalledApi));
    assert!(!runtime.state().is_submitting);
    abandon(runtime.save_draft(&StalledApi));
    assert!(!runtime.state().is_submitting);
    abandon(runtime.load_survey(&StalledApi, "slow-survey", 0));
    assert!(!runtime.state().is_loading);

    let api = MockApi::default();
    runtime.save_draft(&api).await.expect("draft after abandon");
    runtime
        .load_survey(&api, "tracer-2026", 0)
        .await
        .expect("load after abandon");
    let receipt = runtime.submit_survey(&api).await.expect("submit after abandon");
    assert_eq!(receipt.id, "resp-1");
    assert!(runtime.state().is_completed);
}
