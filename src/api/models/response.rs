use super::document::DocumentMeta;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Value submitted for one question.
///
/// The accepted shape depends on the question type: text and single
/// choice take `Text`, rating takes `Number`, checkbox and file take
/// `List`, and sections take a `Map` keyed by sub-question id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Number(f64),
    Text(String),
    List(Vec<String>),
    Map(BTreeMap<String, AnswerValue>),
}

impl AnswerValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            AnswerValue::Number(_) => "number",
            AnswerValue::Text(_) => "text",
            AnswerValue::List(_) => "list",
            AnswerValue::Map(_) => "map",
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::Number(_) => false,
            AnswerValue::Text(s) => s.trim().is_empty(),
            AnswerValue::List(items) => items.is_empty(),
            AnswerValue::Map(entries) => entries.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    #[serde(alias = "question")]
    pub question_id: String,
    #[serde(alias = "response")]
    pub value: AnswerValue,
}

impl Answer {
    pub fn new(question_id: impl Into<String>, value: AnswerValue) -> Self {
        Self {
            question_id: question_id.into(),
            value,
        }
    }
}

/// One submitted answer-set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormResponse {
    #[serde(flatten)]
    pub meta: DocumentMeta,
    pub form: Uuid,
    #[serde(default)]
    pub responder: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub answers: Vec<Answer>,
    pub submitted_at: DateTime<Utc>,
}

impl FormResponse {
    pub fn new(form: Uuid, responder: Option<Uuid>, answers: Vec<Answer>) -> Self {
        Self {
            meta: DocumentMeta::new(),
            form,
            responder,
            email: None,
            answers,
            submitted_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.meta.id
    }

    pub fn answer_for(&self, question_id: &str) -> Option<&AnswerValue> {
        self.answers
            .iter()
            .find(|a| a.question_id == question_id)
            .map(|a| &a.value)
    }
}
