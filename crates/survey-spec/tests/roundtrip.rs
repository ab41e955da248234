use survey_spec::{QuestionKind, QuestionType, SurveyDocument, document_schema};

fn fixture(name: &str) -> &'static str {
    match name {
        "tracer_study" => include_str!("../tests/fixtures/tracer_study.json"),
        _ => panic!("unknown fixture {}", name),
    }
}

#[test]
fn survey_document_roundtrip() {
    let raw = fixture("tracer_study");
    let parsed = SurveyDocument::from_json(raw).expect("deserialize");
    let serialized = parsed.to_json_pretty().expect("serialize");
    let re_parsed = SurveyDocument::from_json(&serialized).expect("roundtrip");
    assert_eq!(parsed, re_parsed);
}

#[test]
fn question_variants_parse_with_their_bodies() {
    let parsed = SurveyDocument::from_json(fixture("tracer_study")).expect("deserialize");
    let kinds: Vec<QuestionType> = parsed
        .questions
        .iter()
        .map(|question| question.question.question_type())
        .collect();
    assert_eq!(
        kinds,
        vec![
            QuestionType::Text,
            QuestionType::Text,
            QuestionType::Single,
            QuestionType::Combobox,
            QuestionType::Rating,
            QuestionType::Single,
            QuestionType::Text,
            QuestionType::Multiple,
        ]
    );

    match &parsed.questions[4].question.kind {
        QuestionKind::Rating(spec) => {
            assert_eq!(spec.rating_items.len(), 3);
            assert_eq!(spec.rating_options.len(), 5, "default scale applies");
        }
        other => panic!("unexpected kind {other:?}"),
    }
    assert_eq!(
        parsed.questions[2].question.other_option().map(|option| option.value.as_str()),
        Some("lainnya")
    );
}

#[test]
fn page_view_splits_children_into_conditionals() {
    let parsed = SurveyDocument::from_json(fixture("tracer_study")).expect("deserialize");
    assert_eq!(parsed.page_count(), 2);

    let first = parsed.page_view(0).expect("first page");
    assert_eq!(first.title.as_deref(), Some("Data Diri"));
    assert_eq!(first.questions.len(), 3);
    assert!(first.conditionals.is_empty());

    let second = parsed.page_view(1).expect("second page");
    let ids: Vec<&str> = second.questions.iter().map(|q| q.id.as_str()).collect();
    assert_eq!(ids, vec!["q4", "q5", "q10", "q11"]);
    assert_eq!(second.conditionals.len(), 1);
    assert_eq!(second.conditionals[0].trigger_question_id, "q10");
    assert_eq!(second.conditionals[0].trigger_option_value, "ya-pasti");

    assert!(parsed.page_view(2).is_none());
}

#[test]
fn implicit_page_when_document_has_none() {
    let mut parsed = SurveyDocument::from_json(fixture("tracer_study")).expect("deserialize");
    parsed.pages.clear();
    let only = parsed.page_view(0).expect("implicit page");
    assert_eq!(only.questions.len(), 7);
    assert!(only.questions.iter().all(|question| question.id != "q10a"));
}

#[test]
fn schema_compiles() {
    let schema = document_schema();
    let json = serde_json::to_string(&schema).expect("schema serializes");
    assert!(json.starts_with('{'));
    assert!(json.contains("questions"));
}
