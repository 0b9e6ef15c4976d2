//! Accounts, password hashing and permission resolution.

use crate::config::{AdminBootstrap, AppConfig};
use crate::middleware::permissions::{DEFAULT_ROLES, Permission};
use crate::models::{DocumentMeta, Role, User, UserProfile};
use crate::services::error::{ServiceError, ServiceResult};
use crate::storage::{Repository, StorageBackend};
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::{Arc, LazyLock};
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

const MIN_PASSWORD_LEN: usize = 8;

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// A user together with the roles and permissions they hold.
#[derive(Debug, Clone)]
pub struct ResolvedUser {
    pub user: User,
    pub role_names: Vec<String>,
    pub permissions: BTreeSet<String>,
}

impl ResolvedUser {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.user.id(),
            name: self.user.name.clone(),
            email: self.user.email.clone(),
            roles: self.role_names.clone(),
            permissions: self.permissions.iter().cloned().collect(),
        }
    }
}

#[derive(Clone)]
pub struct AuthService {
    users: Repository<User>,
    roles: Repository<Role>,
    config: Arc<AppConfig>,
}

impl AuthService {
    pub fn new(storage: Arc<dyn StorageBackend>, config: Arc<AppConfig>) -> Self {
        Self {
            users: Repository::new(storage.clone()),
            roles: Repository::new(storage),
            config,
        }
    }

    /// Create an account holding the configured default role.
    pub async fn register(&self, request: RegisterRequest) -> ServiceResult<ResolvedUser> {
        let name = request.name.trim().to_string();
        let email = normalize_email(&request.email);

        if name.is_empty() {
            return Err(ServiceError::validation("Field name is required"));
        }
        if !is_valid_email(&email) {
            return Err(ServiceError::validation("Field email is not a valid address"));
        }
        if request.password.len() < MIN_PASSWORD_LEN {
            return Err(ServiceError::validation(format!(
                "Field password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        if self.find_by_email(&email).await?.is_some() {
            return Err(ServiceError::Conflict("Field email already in use".to_string()));
        }

        let roles = match self.role_by_name(&self.config.default_role).await? {
            Some(role) => vec![role.id()],
            None => {
                warn!(
                    "Default role '{}' does not exist; registering user without roles",
                    self.config.default_role
                );
                Vec::new()
            }
        };

        let password_hash = hash_password(request.password, self.config.bcrypt_cost).await?;
        let user = self
            .users
            .create(User {
                meta: DocumentMeta::new(),
                name,
                email,
                password_hash,
                roles,
            })
            .await?;

        info!("Registered user {} ({})", user.id(), user.email);
        self.resolve(user).await
    }

    /// Check credentials. Unknown email and wrong password fail the same way.
    pub async fn login(&self, request: LoginRequest) -> ServiceResult<ResolvedUser> {
        if request.email.trim().is_empty() || request.password.is_empty() {
            return Err(ServiceError::validation(
                "Field email and password are required",
            ));
        }

        let invalid = || ServiceError::Unauthorized("Invalid email or password".to_string());
        let user = self
            .find_by_email(&normalize_email(&request.email))
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(request.password, user.password_hash.clone()).await? {
            return Err(invalid());
        }

        self.resolve(user).await
    }

    /// Load a user by id with their effective permissions.
    pub async fn load_user(&self, user_id: Uuid) -> ServiceResult<Option<ResolvedUser>> {
        match self.users.find(user_id).await? {
            Some(user) => Ok(Some(self.resolve(user).await?)),
            None => Ok(None),
        }
    }

    /// Effective permissions are the union over every held role. Role ids
    /// that no longer resolve are ignored.
    pub async fn resolve(&self, user: User) -> ServiceResult<ResolvedUser> {
        let mut role_names = Vec::new();
        let mut permissions = BTreeSet::new();

        for role_id in &user.roles {
            if let Some(role) = self.roles.find(*role_id).await? {
                permissions.extend(role.permissions.iter().cloned());
                role_names.push(role.name);
            }
        }

        Ok(ResolvedUser {
            user,
            role_names,
            permissions,
        })
    }

    /// Create the built-in roles that do not exist yet. Existing roles are
    /// left untouched so edits made by administrators survive restarts.
    pub async fn seed_default_roles(&self) -> ServiceResult<usize> {
        let mut created = 0;
        for (name, description) in DEFAULT_ROLES {
            if self.role_by_name(name).await?.is_some() {
                continue;
            }
            let permissions = Permission::for_role(name)
                .into_iter()
                .map(|p| p.as_str().to_string())
                .collect();
            self.roles
                .create(Role::new(name, Some(description.to_string()), permissions))
                .await?;
            info!("Seeded default role '{}'", name);
            created += 1;
        }
        Ok(created)
    }

    /// Create the bootstrap administrator when no account uses its email.
    pub async fn ensure_admin(&self, admin: &AdminBootstrap) -> ServiceResult<()> {
        let email = normalize_email(&admin.email);
        if self.find_by_email(&email).await?.is_some() {
            return Ok(());
        }

        let role = self
            .role_by_name("admin")
            .await?
            .ok_or_else(|| ServiceError::not_found("Role", "admin"))?;
        let password_hash = hash_password(admin.password.clone(), self.config.bcrypt_cost).await?;

        let user = self
            .users
            .create(User {
                meta: DocumentMeta::new(),
                name: admin.name.clone(),
                email,
                password_hash,
                roles: vec![role.id()],
            })
            .await?;
        info!("Created bootstrap admin account {}", user.email);
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        Ok(self.users.find_where(|u| u.email == email).await?)
    }

    async fn role_by_name(&self, name: &str) -> ServiceResult<Option<Role>> {
        Ok(self.roles.find_where(|r| r.name == name).await?)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn hash_password(password: String, cost: u32) -> ServiceResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| ServiceError::Internal(format!("Password hashing task failed: {}", e)))?
        .map_err(|e| ServiceError::Internal(format!("Failed to hash password: {}", e)))
}

async fn verify_password(password: String, hash: String) -> ServiceResult<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
        .await
        .map_err(|e| ServiceError::Internal(format!("Password verification task failed: {}", e)))
}
