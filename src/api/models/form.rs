use super::document::DocumentMeta;
use super::localized::{LocalizedText, deserialize_localized};
use super::question::Question;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stored lifecycle status of a form.
///
/// `Auto` is a mode flag: the visible status is derived from the schedule
/// (see `services::status_policy::effective_status`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormStatus {
    #[default]
    Draft,
    Open,
    #[serde(alias = "closed")]
    Close,
    Auto,
}

impl FormStatus {
    pub const ALL: [FormStatus; 4] = [
        FormStatus::Draft,
        FormStatus::Open,
        FormStatus::Close,
        FormStatus::Auto,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FormStatus::Draft => "draft",
            FormStatus::Open => "open",
            FormStatus::Close => "close",
            FormStatus::Auto => "auto",
        }
    }
}

impl fmt::Display for FormStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Publication window. Either bound may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    #[serde(default)]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_at: Option<DateTime<Utc>>,
}

impl Schedule {
    pub fn new(start_at: Option<DateTime<Utc>>, end_at: Option<DateTime<Utc>>) -> Self {
        Self { start_at, end_at }
    }

    /// `startAt < endAt` whenever both are set.
    pub fn is_valid(&self) -> bool {
        match (self.start_at, self.end_at) {
            (Some(start), Some(end)) => start < end,
            _ => true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start_at.is_none() && self.end_at.is_none()
    }
}

/// Who may submit responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    #[default]
    Anyone,
    Authenticated,
}

/// Response-collection policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormSettings {
    pub who_can_respond: Audience,
    pub collect_emails: bool,
    pub limit_responses: bool,
    pub max_responses: u32,
    pub show_progress_bar: bool,
    pub confirmation_message: String,
    pub show_another_response_link: bool,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            who_can_respond: Audience::Anyone,
            collect_emails: false,
            limit_responses: false,
            max_responses: 100,
            show_progress_bar: true,
            confirmation_message:
                "Thank you for completing this survey. Your response has been recorded."
                    .to_string(),
            show_another_response_link: true,
        }
    }
}

/// A questionnaire definition.
///
/// Lineage is stored only as `original_form_id`; the list of forms cloned
/// from this one is computed on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    #[serde(flatten)]
    pub meta: DocumentMeta,
    #[serde(deserialize_with = "deserialize_localized")]
    pub title: Vec<LocalizedText>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub status: FormStatus,
    #[serde(default)]
    pub schedule: Schedule,
    #[serde(default)]
    pub settings: FormSettings,
    #[serde(default)]
    pub can_duplicate: bool,
    #[serde(default)]
    pub original_form_id: Option<Uuid>,
    #[serde(default)]
    pub responses: Vec<Uuid>,
    #[serde(default)]
    pub owner_id: Option<Uuid>,
}

impl Form {
    pub fn new(title: Vec<LocalizedText>) -> Self {
        Self {
            meta: DocumentMeta::new(),
            title,
            description: String::new(),
            questions: Vec::new(),
            status: FormStatus::Draft,
            schedule: Schedule::default(),
            settings: FormSettings::default(),
            can_duplicate: false,
            original_form_id: None,
            responses: Vec::new(),
            owner_id: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.meta.id
    }

    /// Look up a question anywhere in the tree by id.
    pub fn find_question(&self, question_id: &str) -> Option<&Question> {
        super::question::walk_questions(&self.questions)
            .into_iter()
            .map(|node| node.question)
            .find(|q| q.id == question_id)
    }

    /// Clone this form as a fresh draft descended from it. Identity,
    /// lineage and collected responses are not carried over.
    pub fn duplicate(&self, owner_id: Option<Uuid>) -> Form {
        Form {
            meta: DocumentMeta::new(),
            title: self.title.clone(),
            description: self.description.clone(),
            questions: self.questions.clone(),
            status: FormStatus::Draft,
            schedule: self.schedule,
            settings: self.settings.clone(),
            can_duplicate: self.can_duplicate,
            original_form_id: Some(self.meta.id),
            responses: Vec::new(),
            owner_id,
        }
    }
}
