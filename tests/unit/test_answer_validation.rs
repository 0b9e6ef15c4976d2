//! Submission-time answer validation

use form_platform_api::models::{
    Answer, AnswerValue, ChoiceOption, Form, LocalizedText, Question, QuestionKind,
};
use form_platform_api::services::{AnswerError, validate_answers};
use std::collections::BTreeMap;

fn text(s: &str) -> AnswerValue {
    AnswerValue::Text(s.to_string())
}

fn list(items: &[&str]) -> AnswerValue {
    AnswerValue::List(items.iter().map(|s| s.to_string()).collect())
}

fn survey() -> Form {
    let mut form = Form::new(vec![LocalizedText::new("en", "Onboarding")]);
    form.questions = vec![
        Question::new("name", "Name", QuestionKind::Text { multiline: false })
            .with_order(1)
            .required(),
        Question::new(
            "score",
            "Score",
            QuestionKind::Rating {
                min: 0.0,
                max: 10.0,
                step: 0.5,
            },
        )
        .with_order(2),
        Question::new(
            "source",
            "How did you hear about us?",
            QuestionKind::Choices {
                options: vec![
                    ChoiceOption::new("Search"),
                    ChoiceOption::new("Friend").with_follow_up(
                        Question::new("referrer", "Who referred you?", QuestionKind::Text {
                            multiline: false,
                        })
                        .required(),
                    ),
                ],
            },
        )
        .with_order(3),
        Question::new(
            "tools",
            "Tools",
            QuestionKind::Checkbox {
                options: vec![
                    ChoiceOption::new("Git"),
                    ChoiceOption::new("Docker"),
                    ChoiceOption::new("Rust"),
                ],
                max_selections: Some(2),
            },
        )
        .with_order(4),
        Question::new(
            "contact",
            "Contact",
            QuestionKind::Section {
                sub_questions: vec![
                    Question::new("phone", "Phone", QuestionKind::Text { multiline: false })
                        .required(),
                ],
            },
        )
        .with_order(5),
        Question::new("banner", "Welcome", QuestionKind::Title).with_order(6),
    ];
    form
}

fn contact(phone: &str) -> Answer {
    let mut entries = BTreeMap::new();
    entries.insert("phone".to_string(), text(phone));
    Answer::new("contact", AnswerValue::Map(entries))
}

#[test]
fn test_valid_answer_set() {
    let answers = vec![
        Answer::new("name", text("Ada")),
        Answer::new("score", AnswerValue::Number(7.5)),
        Answer::new("source", text("Search")),
        Answer::new("tools", list(&["Git", "Rust"])),
        contact("555-0100"),
    ];
    assert_eq!(validate_answers(&survey(), &answers), Ok(()));
}

#[test]
fn test_missing_required_question() {
    let errors = validate_answers(&survey(), &[contact("555-0100")]).unwrap_err();
    assert_eq!(errors, vec![AnswerError::MissingRequired("name".to_string())]);
}

#[test]
fn test_blank_text_counts_as_missing() {
    let errors =
        validate_answers(&survey(), &[Answer::new("name", text("  ")), contact("1")]).unwrap_err();
    assert!(errors.contains(&AnswerError::MissingRequired("name".to_string())));
}

#[test]
fn test_required_sub_question_of_section() {
    let answers = vec![
        Answer::new("name", text("Ada")),
        Answer::new("contact", AnswerValue::Map(BTreeMap::new())),
    ];
    let errors = validate_answers(&survey(), &answers).unwrap_err();
    assert_eq!(errors, vec![AnswerError::MissingRequired("phone".to_string())]);
}

#[test]
fn test_follow_up_required_only_when_option_selected() {
    let base = vec![Answer::new("name", text("Ada")), contact("1")];

    let mut search = base.clone();
    search.push(Answer::new("source", text("Search")));
    assert_eq!(validate_answers(&survey(), &search), Ok(()));

    let mut friend = base.clone();
    friend.push(Answer::new("source", text("Friend")));
    let errors = validate_answers(&survey(), &friend).unwrap_err();
    assert_eq!(errors, vec![AnswerError::MissingRequired("referrer".to_string())]);

    friend.push(Answer::new("referrer", text("Grace")));
    assert_eq!(validate_answers(&survey(), &friend), Ok(()));
}

#[test]
fn test_rating_range_and_step() {
    let base = vec![Answer::new("name", text("Ada")), contact("1")];

    let mut out_of_range = base.clone();
    out_of_range.push(Answer::new("score", AnswerValue::Number(11.0)));
    assert!(matches!(
        validate_answers(&survey(), &out_of_range).unwrap_err()[0],
        AnswerError::OutOfRange { .. }
    ));

    let mut off_step = base.clone();
    off_step.push(Answer::new("score", AnswerValue::Number(3.3)));
    assert!(matches!(
        validate_answers(&survey(), &off_step).unwrap_err()[0],
        AnswerError::OffStep { .. }
    ));
}

#[test]
fn test_type_mismatch() {
    let answers = vec![
        Answer::new("name", text("Ada")),
        Answer::new("score", text("high")),
        contact("1"),
    ];
    let errors = validate_answers(&survey(), &answers).unwrap_err();
    assert_eq!(
        errors,
        vec![AnswerError::TypeMismatch {
            question_id: "score".to_string(),
            expected: "number",
            found: "text",
        }]
    );
}

#[test]
fn test_checkbox_options_and_limit() {
    let base = vec![Answer::new("name", text("Ada")), contact("1")];

    let mut unknown = base.clone();
    unknown.push(Answer::new("tools", list(&["Git", "Vim"])));
    assert_eq!(
        validate_answers(&survey(), &unknown).unwrap_err(),
        vec![AnswerError::UnknownOption {
            question_id: "tools".to_string(),
            option: "Vim".to_string(),
        }]
    );

    let mut too_many = base.clone();
    too_many.push(Answer::new("tools", list(&["Git", "Docker", "Rust"])));
    assert_eq!(
        validate_answers(&survey(), &too_many).unwrap_err(),
        vec![AnswerError::TooManySelections {
            question_id: "tools".to_string(),
            max: 2,
            found: 3,
        }]
    );
}

#[test]
fn test_unknown_duplicate_and_layout_answers() {
    let answers = vec![
        Answer::new("name", text("Ada")),
        Answer::new("name", text("Ada again")),
        Answer::new("ghost", text("boo")),
        Answer::new("banner", text("hi")),
        contact("1"),
    ];
    let errors = validate_answers(&survey(), &answers).unwrap_err();

    assert!(errors.contains(&AnswerError::DuplicateAnswer("name".to_string())));
    assert!(errors.contains(&AnswerError::UnknownQuestion("ghost".to_string())));
    assert!(errors.contains(&AnswerError::NotAnswerable {
        question_id: "banner".to_string(),
        question_type: "title",
    }));
}
