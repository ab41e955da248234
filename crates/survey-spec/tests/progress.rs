use survey_spec::spec::question::TextSpec;
use survey_spec::{
    AnswerMap, OtherValues, Progress, Question, QuestionKind, answered_count, can_submit,
};

fn text(id: &str, required: bool) -> Question {
    Question::new(id, id, QuestionKind::Text(TextSpec::default())).required(required)
}

#[test]
fn progress_reports_one_based_position() {
    assert_eq!(
        Progress::at(0, 4),
        Progress {
            current: 1,
            total: 4,
            percentage: 25
        }
    );
    assert_eq!(Progress::at(2, 3).percentage, 100);
    assert_eq!(Progress::at(9, 3).current, 3);
    assert_eq!(Progress::at(0, 0).percentage, 0);
}

#[test]
fn blank_text_does_not_count_as_answered() {
    let questions = vec![text("q1", true), text("q2", false)];
    let mut answers = AnswerMap::new();
    answers.insert("q1".into(), "  ".into());
    answers.insert("q2".into(), "isi".into());
    assert_eq!(answered_count(&questions, &answers), 1);
    assert!(!can_submit(&questions, &answers, &OtherValues::new()));

    answers.insert("q1".into(), "Budi".into());
    assert_eq!(answered_count(&questions, &answers), 2);
    assert!(can_submit(&questions, &answers, &OtherValues::new()));
}
