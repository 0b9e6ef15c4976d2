//! Submission-time validation of answers against the form's question tree.
//!
//! Each answer value must match the shape its question type expects:
//!
//! - `text`: a string
//! - `rating`: a number inside `[min, max]` on the `step` grid
//! - `choices`: a string naming one of the options
//! - `checkbox`: a list of option texts, at most `maxSelections`
//! - `file`: a list of file references, at most `maxFiles`
//! - `section`: a map keyed by sub-question id
//!
//! Required questions are checked only where they are reachable: top-level
//! questions, sub-questions of sections, and follow-ups of options the
//! responder actually selected.

use crate::models::{Answer, AnswerValue, Form, Question, QuestionKind};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

const STEP_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnswerError {
    #[error("question '{0}' does not belong to this form")]
    UnknownQuestion(String),

    #[error("question '{question_id}' of type '{question_type}' cannot be answered")]
    NotAnswerable {
        question_id: String,
        question_type: &'static str,
    },

    #[error("question '{0}' was answered more than once")]
    DuplicateAnswer(String),

    #[error("question '{question_id}' expects a {expected} value, got {found}")]
    TypeMismatch {
        question_id: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("rating {value} for question '{question_id}' is outside {min}..={max}")]
    OutOfRange {
        question_id: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("rating {value} for question '{question_id}' is not a multiple of step {step}")]
    OffStep {
        question_id: String,
        value: f64,
        step: f64,
    },

    #[error("'{option}' is not an option of question '{question_id}'")]
    UnknownOption { question_id: String, option: String },

    #[error("question '{question_id}' allows at most {max} selections, got {found}")]
    TooManySelections {
        question_id: String,
        max: usize,
        found: usize,
    },

    #[error("question '{question_id}' allows at most {max} files, got {found}")]
    TooManyFiles {
        question_id: String,
        max: usize,
        found: usize,
    },

    #[error("question '{0}' is required")]
    MissingRequired(String),
}

/// Validate a full answer-set. All problems are collected, not just the
/// first one.
pub fn validate_answers(form: &Form, answers: &[Answer]) -> Result<(), Vec<AnswerError>> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for answer in answers {
        if !seen.insert(answer.question_id.as_str()) {
            errors.push(AnswerError::DuplicateAnswer(answer.question_id.clone()));
            continue;
        }
        match form.find_question(&answer.question_id) {
            Some(question) => validate_value(question, &answer.value, &mut errors),
            None => errors.push(AnswerError::UnknownQuestion(answer.question_id.clone())),
        }
    }

    let provided = collect_provided(form, answers);
    check_required(&form.questions, &provided, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate one value, descending into section maps with an explicit stack.
fn validate_value(question: &Question, value: &AnswerValue, errors: &mut Vec<AnswerError>) {
    let mut stack = vec![(question, value)];

    while let Some((question, value)) = stack.pop() {
        let id = &question.id;
        match (&question.kind, value) {
            (QuestionKind::Text { .. }, AnswerValue::Text(_)) => {}

            (QuestionKind::Rating { min, max, step }, AnswerValue::Number(n)) => {
                if n < min || n > max {
                    errors.push(AnswerError::OutOfRange {
                        question_id: id.clone(),
                        value: *n,
                        min: *min,
                        max: *max,
                    });
                } else if *step > 0.0 && !on_step(*n, *min, *step) {
                    errors.push(AnswerError::OffStep {
                        question_id: id.clone(),
                        value: *n,
                        step: *step,
                    });
                }
            }

            (QuestionKind::Choices { options }, AnswerValue::Text(selected)) => {
                if !options.iter().any(|o| &o.text == selected) {
                    errors.push(AnswerError::UnknownOption {
                        question_id: id.clone(),
                        option: selected.clone(),
                    });
                }
            }

            (
                QuestionKind::Checkbox {
                    options,
                    max_selections,
                },
                AnswerValue::List(selected),
            ) => {
                for item in selected {
                    if !options.iter().any(|o| &o.text == item) {
                        errors.push(AnswerError::UnknownOption {
                            question_id: id.clone(),
                            option: item.clone(),
                        });
                    }
                }
                if let Some(max) = max_selections {
                    if selected.len() > *max {
                        errors.push(AnswerError::TooManySelections {
                            question_id: id.clone(),
                            max: *max,
                            found: selected.len(),
                        });
                    }
                }
            }

            (QuestionKind::File { max_files, .. }, AnswerValue::List(files)) => {
                if files.len() > *max_files {
                    errors.push(AnswerError::TooManyFiles {
                        question_id: id.clone(),
                        max: *max_files,
                        found: files.len(),
                    });
                }
            }

            (QuestionKind::Section { sub_questions }, AnswerValue::Map(entries)) => {
                for (key, sub_value) in entries {
                    match sub_questions.iter().find(|q| &q.id == key) {
                        Some(sub) => stack.push((sub, sub_value)),
                        None => errors.push(AnswerError::UnknownQuestion(key.clone())),
                    }
                }
            }

            (kind, _) if !kind.is_answerable() => errors.push(AnswerError::NotAnswerable {
                question_id: id.clone(),
                question_type: kind.type_name(),
            }),

            (kind, value) => errors.push(AnswerError::TypeMismatch {
                question_id: id.clone(),
                expected: expected_shape(kind),
                found: value.kind_name(),
            }),
        }
    }
}

fn on_step(value: f64, min: f64, step: f64) -> bool {
    let steps = (value - min) / step;
    (steps - steps.round()).abs() < STEP_TOLERANCE
}

fn expected_shape(kind: &QuestionKind) -> &'static str {
    match kind {
        QuestionKind::Rating { .. } => "number",
        QuestionKind::Checkbox { .. } | QuestionKind::File { .. } => "list",
        QuestionKind::Section { .. } => "map",
        _ => "text",
    }
}

/// Every answered question id, including sub-questions answered through a
/// section map.
fn collect_provided<'a>(form: &Form, answers: &'a [Answer]) -> HashMap<String, &'a AnswerValue> {
    let mut provided = HashMap::new();
    let mut stack: Vec<(String, &AnswerValue)> = answers
        .iter()
        .map(|a| (a.question_id.clone(), &a.value))
        .collect();

    while let Some((id, value)) = stack.pop() {
        if let AnswerValue::Map(entries) = value {
            let is_section = matches!(
                form.find_question(&id).map(|q| &q.kind),
                Some(QuestionKind::Section { .. })
            );
            if is_section {
                stack.extend(entries.iter().map(|(k, v)| (k.clone(), v)));
            }
        }
        provided.entry(id).or_insert(value);
    }
    provided
}

fn check_required(
    roots: &[Question],
    provided: &HashMap<String, &AnswerValue>,
    errors: &mut Vec<AnswerError>,
) {
    let mut stack: Vec<&Question> = roots.iter().collect();

    while let Some(question) = stack.pop() {
        let answer = provided.get(&question.id).copied();

        if question.required
            && question.kind.is_answerable()
            && !matches!(question.kind, QuestionKind::Section { .. })
            && answer.is_none_or(AnswerValue::is_empty)
        {
            errors.push(AnswerError::MissingRequired(question.id.clone()));
        }

        match &question.kind {
            QuestionKind::Section { sub_questions } => stack.extend(sub_questions.iter()),
            kind => {
                let selected: Vec<&str> = match answer {
                    Some(AnswerValue::Text(s)) => vec![s.as_str()],
                    Some(AnswerValue::List(items)) => items.iter().map(String::as_str).collect(),
                    _ => Vec::new(),
                };
                stack.extend(
                    kind.options()
                        .iter()
                        .filter(|o| selected.contains(&o.text.as_str()))
                        .filter_map(|o| o.follow_up_question.as_deref()),
                );
            }
        }
    }
}
