use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity and bookkeeping fields shared by every stored document.
///
/// The storage layer owns these values: `id` is generated at creation,
/// `version` is bumped on every successful replace and the timestamps are
/// stamped by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMeta {
    pub id: Uuid,
    #[serde(default = "initial_version")]
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn initial_version() -> i32 {
    1
}

impl DocumentMeta {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Default for DocumentMeta {
    fn default() -> Self {
        Self::new()
    }
}
