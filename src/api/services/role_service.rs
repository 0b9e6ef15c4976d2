//! Role administration and role assignment.

use crate::middleware::permissions::parse_permissions;
use crate::models::{Role, User};
use crate::services::auth_service::{AuthService, ResolvedUser};
use crate::services::error::{ServiceError, ServiceResult};
use crate::storage::{Repository, StorageBackend};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateRoleRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoleRequest {
    pub id: Uuid,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: Option<Vec<String>>,
}

#[derive(Clone)]
pub struct RoleService {
    roles: Repository<Role>,
    users: Repository<User>,
    auth: AuthService,
}

impl RoleService {
    pub fn new(storage: Arc<dyn StorageBackend>, auth: AuthService) -> Self {
        Self {
            roles: Repository::new(storage.clone()),
            users: Repository::new(storage),
            auth,
        }
    }

    pub async fn list(&self) -> ServiceResult<Vec<Role>> {
        let mut roles = self.roles.list().await?;
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<Role> {
        Ok(self.roles.get(id).await?)
    }

    pub async fn create(&self, request: CreateRoleRequest) -> ServiceResult<Role> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::validation("Field name is required"));
        }
        validate_permissions(&request.permissions)?;
        self.ensure_name_free(&name, None).await?;

        let role = self
            .roles
            .create(Role::new(name, request.description, request.permissions))
            .await?;
        info!("Created role '{}' ({})", role.name, role.id());
        Ok(role)
    }

    pub async fn update(&self, request: UpdateRoleRequest) -> ServiceResult<Role> {
        if let Some(permissions) = &request.permissions {
            validate_permissions(permissions)?;
        }
        let name = match request.name.as_deref().map(str::trim) {
            Some("") => return Err(ServiceError::validation("Field name cannot be empty")),
            Some(name) => {
                self.ensure_name_free(name, Some(request.id)).await?;
                Some(name.to_string())
            }
            None => None,
        };

        self.roles
            .modify(request.id, |role: &mut Role| {
                if let Some(name) = &name {
                    role.name = name.clone();
                }
                if request.description.is_some() {
                    role.description = request.description.clone();
                }
                if let Some(permissions) = &request.permissions {
                    role.set_permissions(permissions.iter().cloned());
                }
                Ok::<(), ServiceError>(())
            })
            .await
    }

    /// Delete a role and detach it from every user holding it.
    pub async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        if !self.roles.delete(id).await? {
            return Err(ServiceError::not_found("Role", id));
        }

        let holders = self.users.list_where(|u| u.roles.contains(&id)).await?;
        for user in holders {
            let user_id = user.id();
            let detached = self
                .users
                .modify(user_id, |u: &mut User| {
                    u.roles.retain(|r| *r != id);
                    Ok::<(), ServiceError>(())
                })
                .await;
            if let Err(e) = detached {
                warn!("Failed to detach role {} from user {}: {}", id, user_id, e);
            }
        }
        info!("Deleted role {}", id);
        Ok(())
    }

    /// Replace a role's permission set.
    pub async fn set_permissions(&self, id: Uuid, permissions: Vec<String>) -> ServiceResult<Role> {
        validate_permissions(&permissions)?;
        self.roles
            .modify(id, |role: &mut Role| {
                role.set_permissions(permissions.iter().cloned());
                Ok::<(), ServiceError>(())
            })
            .await
    }

    /// Grant permissions; ones already held are ignored.
    pub async fn add_permissions(&self, id: Uuid, permissions: Vec<String>) -> ServiceResult<Role> {
        validate_permissions(&permissions)?;
        self.roles
            .modify(id, |role: &mut Role| {
                for permission in &permissions {
                    role.add_permission(permission.trim());
                }
                Ok::<(), ServiceError>(())
            })
            .await
    }

    /// Revoke permissions; ones not held are ignored.
    pub async fn remove_permissions(&self, id: Uuid, permissions: Vec<String>) -> ServiceResult<Role> {
        self.roles
            .modify(id, |role: &mut Role| {
                for permission in &permissions {
                    role.remove_permission(permission.trim());
                }
                Ok::<(), ServiceError>(())
            })
            .await
    }

    /// Set the full list of roles a user holds.
    pub async fn assign_roles(&self, user_id: Uuid, role_ids: Vec<Uuid>) -> ServiceResult<ResolvedUser> {
        let mut unique = Vec::with_capacity(role_ids.len());
        for role_id in role_ids {
            if unique.contains(&role_id) {
                continue;
            }
            if self.roles.find(role_id).await?.is_none() {
                return Err(ServiceError::not_found("Role", role_id));
            }
            unique.push(role_id);
        }

        let user = self
            .users
            .modify(user_id, |user: &mut User| {
                user.roles = unique.clone();
                Ok::<(), ServiceError>(())
            })
            .await?;
        info!("Assigned {} role(s) to user {}", user.roles.len(), user_id);
        self.auth.resolve(user).await
    }

    async fn ensure_name_free(&self, name: &str, except: Option<Uuid>) -> ServiceResult<()> {
        let taken = self
            .roles
            .find_where(|r| r.name.eq_ignore_ascii_case(name) && Some(r.id()) != except)
            .await?;
        match taken {
            Some(_) => Err(ServiceError::Conflict(format!("Role '{}' already exists", name))),
            None => Ok(()),
        }
    }
}

fn validate_permissions(permissions: &[String]) -> ServiceResult<()> {
    parse_permissions(permissions)
        .map(|_| ())
        .map_err(ServiceError::Validation)
}
