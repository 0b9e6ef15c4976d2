use super::document::DocumentMeta;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// A named bundle of permissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[serde(flatten)]
    pub meta: DocumentMeta,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Kept sorted and free of duplicates.
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl Role {
    pub fn new(name: impl Into<String>, description: Option<String>, permissions: Vec<String>) -> Self {
        let mut role = Self {
            meta: DocumentMeta::new(),
            name: name.into(),
            description,
            permissions: Vec::new(),
        };
        role.set_permissions(permissions);
        role
    }

    pub fn id(&self) -> Uuid {
        self.meta.id
    }

    pub fn set_permissions(&mut self, permissions: impl IntoIterator<Item = String>) {
        let unique: BTreeSet<String> = permissions
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        self.permissions = unique.into_iter().collect();
    }

    /// Returns false when the permission was already present.
    pub fn add_permission(&mut self, permission: &str) -> bool {
        if self.has_permission(permission) {
            return false;
        }
        let mut all = std::mem::take(&mut self.permissions);
        all.push(permission.to_string());
        self.set_permissions(all);
        true
    }

    /// Returns false when the permission was not present.
    pub fn remove_permission(&mut self, permission: &str) -> bool {
        let before = self.permissions.len();
        self.permissions.retain(|p| p != permission);
        before != self.permissions.len()
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}
