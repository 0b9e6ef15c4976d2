//! Question tree.
//!
//! A question owns its follow-ups: choice and checkbox options may carry a
//! nested follow-up question, and sections own a list of sub-questions.
//! Depth is unbounded, so traversal uses an explicit stack
//! ([`walk_questions`]) rather than recursion.

use super::localized::{LocalizedText, deserialize_localized};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(default = "generate_question_id")]
    pub id: String,
    #[serde(default)]
    pub order: i32,
    #[serde(
        default,
        alias = "questionText",
        alias = "question",
        deserialize_with = "deserialize_localized"
    )]
    pub title: Vec<LocalizedText>,
    #[serde(default)]
    pub required: bool,
    #[serde(flatten)]
    pub kind: QuestionKind,
}

fn generate_question_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Type discriminator plus the type-specific payload.
///
/// New question types are added as variants; unknown `type` values are
/// rejected at deserialization time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
#[non_exhaustive]
pub enum QuestionKind {
    #[serde(alias = "short", alias = "paragraph")]
    Text {
        #[serde(default)]
        multiline: bool,
    },
    Rating {
        #[serde(default = "default_rating_min")]
        min: f64,
        #[serde(default = "default_rating_max", alias = "maxRating")]
        max: f64,
        #[serde(default = "default_rating_step")]
        step: f64,
    },
    Checkbox {
        #[serde(default)]
        options: Vec<ChoiceOption>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_selections: Option<usize>,
    },
    #[serde(alias = "dropdown", alias = "multiple-choice")]
    Choices {
        #[serde(default)]
        options: Vec<ChoiceOption>,
    },
    File {
        #[serde(default = "default_max_files")]
        max_files: usize,
        #[serde(default = "default_max_size_mb", alias = "maxSize")]
        max_size_mb: u32,
        #[serde(default, alias = "allowedFileTypes")]
        allowed_types: Vec<String>,
    },
    Section {
        #[serde(default)]
        sub_questions: Vec<Question>,
    },
    Title,
    Image {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image_url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
    Divider,
}

fn default_rating_min() -> f64 {
    1.0
}

fn default_rating_max() -> f64 {
    5.0
}

fn default_rating_step() -> f64 {
    1.0
}

fn default_max_files() -> usize {
    1
}

fn default_max_size_mb() -> u32 {
    10
}

impl QuestionKind {
    /// Wire name of the type.
    pub fn type_name(&self) -> &'static str {
        match self {
            QuestionKind::Text { .. } => "text",
            QuestionKind::Rating { .. } => "rating",
            QuestionKind::Checkbox { .. } => "checkbox",
            QuestionKind::Choices { .. } => "choices",
            QuestionKind::File { .. } => "file",
            QuestionKind::Section { .. } => "section",
            QuestionKind::Title => "title",
            QuestionKind::Image { .. } => "image",
            QuestionKind::Divider => "divider",
        }
    }

    /// Layout-only types cannot be answered.
    pub fn is_answerable(&self) -> bool {
        !matches!(
            self,
            QuestionKind::Title | QuestionKind::Image { .. } | QuestionKind::Divider
        )
    }

    pub fn options(&self) -> &[ChoiceOption] {
        match self {
            QuestionKind::Checkbox { options, .. } | QuestionKind::Choices { options } => options,
            _ => &[],
        }
    }
}

/// A selectable option, optionally carrying a follow-up question shown
/// when the option is picked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "OptionRepr")]
pub struct ChoiceOption {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up_question: Option<Box<Question>>,
}

impl ChoiceOption {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
            follow_up_question: None,
        }
    }

    pub fn with_follow_up(mut self, question: Question) -> Self {
        self.follow_up_question = Some(Box::new(question));
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OptionRepr {
    Plain(String),
    #[serde(rename_all = "camelCase")]
    Full {
        #[serde(default)]
        id: Option<i64>,
        text: String,
        #[serde(default)]
        follow_up_question: Option<Box<Question>>,
    },
}

impl From<OptionRepr> for ChoiceOption {
    fn from(repr: OptionRepr) -> Self {
        match repr {
            OptionRepr::Plain(text) => ChoiceOption::new(text),
            OptionRepr::Full {
                id,
                text,
                follow_up_question,
            } => ChoiceOption {
                id,
                text,
                follow_up_question,
            },
        }
    }
}

impl Question {
    pub fn new(id: impl Into<String>, title: impl Into<String>, kind: QuestionKind) -> Self {
        Self {
            id: id.into(),
            order: 0,
            title: vec![LocalizedText::new(super::localized::DEFAULT_LOCALE, title)],
            required: false,
            kind,
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Direct children: option follow-ups and section sub-questions.
    pub fn children(&self) -> Vec<&Question> {
        match &self.kind {
            QuestionKind::Section { sub_questions } => sub_questions.iter().collect(),
            kind => kind
                .options()
                .iter()
                .filter_map(|o| o.follow_up_question.as_deref())
                .collect(),
        }
    }
}

/// A question visited during a tree walk.
#[derive(Debug, Clone, Copy)]
pub struct QuestionNode<'a> {
    pub question: &'a Question,
    pub depth: usize,
    pub parent_id: Option<&'a str>,
}

/// Pre-order walk of a question forest. Siblings are visited in ascending
/// `order`; ties keep their stored position.
pub fn walk_questions(roots: &[Question]) -> Vec<QuestionNode<'_>> {
    let mut out = Vec::new();
    let mut stack: Vec<QuestionNode<'_>> = sorted_by_order(roots.iter().collect())
        .into_iter()
        .rev()
        .map(|question| QuestionNode {
            question,
            depth: 0,
            parent_id: None,
        })
        .collect();

    while let Some(node) = stack.pop() {
        let children = sorted_by_order(node.question.children());
        for child in children.into_iter().rev() {
            stack.push(QuestionNode {
                question: child,
                depth: node.depth + 1,
                parent_id: Some(node.question.id.as_str()),
            });
        }
        out.push(node);
    }
    out
}

fn sorted_by_order(mut questions: Vec<&Question>) -> Vec<&Question> {
    questions.sort_by_key(|q| q.order);
    questions
}
