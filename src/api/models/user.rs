use super::document::DocumentMeta;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Stored account. The password hash never leaves the service layer;
/// handlers return [`UserProfile`] instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(flatten)]
    pub meta: DocumentMeta,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    #[serde(default)]
    pub roles: Vec<Uuid>,
}

impl User {
    pub fn id(&self) -> Uuid {
        self.meta.id
    }
}

/// Public view of a user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}
