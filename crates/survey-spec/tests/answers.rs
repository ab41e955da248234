use serde_json::json;

use survey_spec::{AnswerMap, AnswerSubmission, AnswerValue, OtherValues, SurveyDocument};

fn document() -> SurveyDocument {
    SurveyDocument::from_json(include_str!("../tests/fixtures/tracer_study.json"))
        .expect("fixture parses")
}

#[test]
fn answer_values_are_untagged_json() {
    let text: AnswerValue = serde_json::from_value(json!("bekerja")).expect("text");
    let many: AnswerValue = serde_json::from_value(json!(["internet", "kampus"])).expect("many");
    assert_eq!(text, AnswerValue::from("bekerja"));
    assert_eq!(many.as_many().map(<[String]>::len), Some(2));
    assert_eq!(serde_json::to_value(&many).expect("serialize"), json!(["internet", "kampus"]));
}

#[test]
fn many_drops_duplicates() {
    let value = AnswerValue::many(["a", "b", "a"]);
    assert_eq!(value, AnswerValue::Many(vec!["a".into(), "b".into()]));
}

#[test]
fn submission_splits_text_and_option_answers() {
    let doc = document();
    let page = doc.page_view(0).expect("page");
    let mut answers = AnswerMap::new();
    answers.insert("q1".into(), "Siti Aminah".into());
    answers.insert("q3".into(), "lainnya".into());
    answers.insert("q4_provinsi".into(), "jabar".into());
    let mut others = OtherValues::new();
    others.insert("q3".into(), "Relawan".into());

    let submission = AnswerSubmission::build("tracer-2026", &page.questions, &answers, &others);
    let body = serde_json::to_value(&submission).expect("serialize");
    assert_eq!(
        body,
        json!({
            "surveyId": "tracer-2026",
            "answers": [
                { "questionId": "q1", "answerText": "Siti Aminah" },
                { "questionId": "q3", "answerText": "Relawan", "answerOptionIds": ["lainnya"] },
                { "questionId": "q4_provinsi", "answerText": "jabar" }
            ]
        })
    );
}

#[test]
fn submission_maps_rating_items_individually() {
    let doc = document();
    let page = doc.page_view(1).expect("page");
    let mut answers = AnswerMap::new();
    answers.insert("q5_etika".into(), "4".into());
    answers.insert("q11".into(), AnswerValue::many(["internet"]));

    let submission = AnswerSubmission::build("tracer-2026", &page.questions, &answers, &OtherValues::new());
    assert_eq!(submission.answers.len(), 2);
    assert_eq!(submission.answers[0].question_id, "q5_etika");
    assert_eq!(submission.answers[0].answer_option_ids, Some(vec!["4".to_string()]));
    assert_eq!(submission.answers[1].question_id, "q11");
    assert_eq!(submission.answers[1].answer_text, None);
}
