use super::document::DocumentMeta;
use super::question::Question;
use serde::{Deserialize, Serialize};

/// A reusable question kept in the question bank, independent of any form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedQuestion {
    #[serde(flatten)]
    pub meta: DocumentMeta,
    pub question: Question,
    #[serde(default)]
    pub tags: Vec<String>,
}
