//! Fine-grained Permissions
//!
//! Roles store permissions as their wire names (`VIEW_FORMS`, ...). Routes
//! list the permissions that admit them; holding any one is enough.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Permission enum for fine-grained access control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    // Forms
    ViewForms,
    CreateForm,
    EditForm,
    DeleteForm,
    DuplicateForm,

    // Question bank
    ViewQuestions,
    ManageQuestions,

    // Responses
    ViewResponses,
    EditResponses,
    DeleteResponses,
    ExportResponses,

    // Roles
    ViewRoles,
    ManageRoles,
}

impl Permission {
    pub const ALL: [Permission; 13] = [
        Permission::ViewForms,
        Permission::CreateForm,
        Permission::EditForm,
        Permission::DeleteForm,
        Permission::DuplicateForm,
        Permission::ViewQuestions,
        Permission::ManageQuestions,
        Permission::ViewResponses,
        Permission::EditResponses,
        Permission::DeleteResponses,
        Permission::ExportResponses,
        Permission::ViewRoles,
        Permission::ManageRoles,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ViewForms => "VIEW_FORMS",
            Permission::CreateForm => "CREATE_FORM",
            Permission::EditForm => "EDIT_FORM",
            Permission::DeleteForm => "DELETE_FORM",
            Permission::DuplicateForm => "DUPLICATE_FORM",
            Permission::ViewQuestions => "VIEW_QUESTIONS",
            Permission::ManageQuestions => "MANAGE_QUESTIONS",
            Permission::ViewResponses => "VIEW_RESPONSES",
            Permission::EditResponses => "EDIT_RESPONSES",
            Permission::DeleteResponses => "DELETE_RESPONSES",
            Permission::ExportResponses => "EXPORT_RESPONSES",
            Permission::ViewRoles => "VIEW_ROLES",
            Permission::ManageRoles => "MANAGE_ROLES",
        }
    }

    /// Default permission set for the built-in roles.
    pub fn for_role(role: &str) -> Vec<Permission> {
        use Permission::*;
        match role {
            "admin" => Self::ALL.to_vec(),
            "editor" => vec![
                ViewForms,
                CreateForm,
                EditForm,
                DeleteForm,
                DuplicateForm,
                ViewQuestions,
                ManageQuestions,
                ViewResponses,
                EditResponses,
                DeleteResponses,
                ExportResponses,
            ],
            "viewer" => vec![ViewForms, ViewResponses],
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| format!("Unknown permission '{}'", s))
    }
}

/// Names of the roles created at startup when missing.
pub const DEFAULT_ROLES: [(&str, &str); 3] = [
    ("admin", "Full access, including role management"),
    ("editor", "Builds forms and manages their responses"),
    ("viewer", "Read-only access to forms and responses"),
];

/// True when `granted` holds at least one of `required`.
pub fn has_any_permission(granted: &BTreeSet<String>, required: &[Permission]) -> bool {
    required.iter().any(|p| granted.contains(p.as_str()))
}

/// Parse and validate permission names, reporting every unknown one.
pub fn parse_permissions<S: AsRef<str>>(names: &[S]) -> Result<Vec<Permission>, String> {
    let mut parsed = Vec::with_capacity(names.len());
    let mut unknown = Vec::new();
    for name in names {
        match name.as_ref().parse::<Permission>() {
            Ok(p) => parsed.push(p),
            Err(_) => unknown.push(name.as_ref().to_string()),
        }
    }
    if unknown.is_empty() {
        Ok(parsed)
    } else {
        Err(format!("Unknown permissions: {}", unknown.join(", ")))
    }
}
