use survey_store::{
    InMemoryPinRepository, PinDirectory, PinLogin, PinRepository, PinSeed, SurveyType,
};

fn directory() -> PinDirectory<InMemoryPinRepository> {
    PinDirectory::new(
        InMemoryPinRepository::seeded(&PinSeed::default(), "salt"),
        "salt",
    )
}

#[test]
fn validation_is_deterministic_until_deactivated() {
    let directory = directory();
    let first = directory
        .validate("573028", SurveyType::TracerStudy)
        .expect("known pin");
    let second = directory
        .validate("573028", SurveyType::TracerStudy)
        .expect("known pin");
    assert_eq!(first.user_id, "TS_002");
    assert_eq!(first.user_id, second.user_id);

    assert!(directory.deactivate("TS_002"));
    assert!(directory.validate("573028", SurveyType::TracerStudy).is_none());
    assert!(!directory.deactivate("TS_999"));
}

#[test]
fn pin_is_scoped_to_its_survey_type() {
    let directory = directory();
    assert!(directory.validate("573028", SurveyType::UserSurvey).is_none());
    assert_eq!(
        directory
            .validate("294817", SurveyType::UserSurvey)
            .map(|record| record.user_id),
        Some("US_001".to_string())
    );
}

#[test]
fn input_is_trimmed_and_empty_is_rejected() {
    let directory = directory();
    assert!(directory.validate("  482913 ", SurveyType::TracerStudy).is_some());
    assert!(directory.validate("   ", SurveyType::TracerStudy).is_none());
    assert!(directory.validate("000000", SurveyType::TracerStudy).is_none());
}

#[test]
fn last_login_is_visible_to_later_lookups() {
    let directory = directory();
    assert!(
        directory
            .lookup_by_user_id("TS_001")
            .expect("seeded")
            .last_login
            .is_none()
    );
    let validated = directory
        .validate("482913", SurveyType::TracerStudy)
        .expect("known pin");
    let looked_up = directory.lookup_by_user_id("TS_001").expect("seeded");
    assert!(looked_up.last_login.is_some());
    assert_eq!(looked_up.last_login, validated.last_login);
}

#[test]
fn login_surface_returns_identity() {
    let directory = directory();
    let identity = directory
        .validate_login(&PinLogin {
            pin: "416039".into(),
            survey_type: "user-survey".into(),
        })
        .expect("known pin");
    assert_eq!(identity.user_id, "US_003");
    assert_eq!(identity.survey_type, SurveyType::UserSurvey);

    let json = serde_json::to_value(&identity).expect("serialize");
    assert_eq!(json["userID"], "US_003");
    assert_eq!(json["surveyType"], "user-survey");

    let unknown_type = PinLogin {
        pin: "416039".into(),
        survey_type: "alumni".into(),
    };
    assert!(directory.validate_login(&unknown_type).is_none());
}

#[test]
fn list_active_filters_inactive_and_type() {
    let directory = directory();
    assert_eq!(directory.list_active(None).len(), 10);
    directory.deactivate("US_005");
    assert_eq!(directory.list_active(Some(SurveyType::UserSurvey)).len(), 4);
    assert_eq!(directory.list_active(Some(SurveyType::TracerStudy)).len(), 5);
    assert!(!directory.repository().lookup("US_005").expect("kept").is_active);
}

#[test]
fn login_request_parses_camel_case() {
    let login: PinLogin =
        serde_json::from_str(r#"{"pin":"482913","surveyType":"tracer-study"}"#).expect("parse");
    assert_eq!(login.survey_type, "tracer-study");
}
