//! Role administration routes.
//!
//! Reading roles needs VIEW_ROLES or MANAGE_ROLES; every change needs
//! MANAGE_ROLES.

use axum::{
    Router,
    extract::State,
    routing::{get, post, put},
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::IdQuery;
use super::app_state::AppState;
use super::auth_context::AuthContext;
use super::error::{ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult};
use crate::middleware::permissions::Permission;
use crate::models::{Role, UserProfile};
use crate::services::role_service::{CreateRoleRequest, UpdateRoleRequest};

#[derive(Debug, Deserialize, ToSchema)]
pub struct RolePermissionsRequest {
    pub id: Uuid,
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignRolesRequest {
    pub user_id: Uuid,
    pub role_ids: Vec<Uuid>,
}

const READ: &[Permission] = &[Permission::ViewRoles, Permission::ManageRoles];
const MANAGE: &[Permission] = &[Permission::ManageRoles];

pub fn roles_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_roles)
                .post(create_role)
                .put(update_role)
                .delete(delete_role_by_query),
        )
        .route("/permissions", put(set_role_permissions))
        .route("/permissions/add", post(add_role_permissions))
        .route("/permissions/remove", post(remove_role_permissions))
        .route("/permissions/catalog", get(permission_catalog))
        .route("/assign", put(assign_roles))
        .route("/{id}", get(get_role).delete(delete_role))
}

/// GET /role - List roles by name
#[utoipa::path(
    get,
    path = "/role",
    tag = "Roles",
    responses(
        (status = 200, description = "Roles", body = Object),
        (status = 403, description = "Missing VIEW_ROLES")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn list_roles(State(state): State<AppState>, auth: AuthContext) -> ApiResult<Vec<Role>> {
    auth.require_any(READ)?;
    Ok(ApiResponse::ok(state.roles.list().await?))
}

/// GET /role/{id} - One role
#[utoipa::path(
    get,
    path = "/role/{id}",
    tag = "Roles",
    params(("id" = Uuid, Path, description = "Role id")),
    responses(
        (status = 200, description = "Role", body = Object),
        (status = 404, description = "Role not found")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn get_role(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Role> {
    auth.require_any(READ)?;
    Ok(ApiResponse::ok(state.roles.get(id).await?))
}

/// POST /role - Create a role
#[utoipa::path(
    post,
    path = "/role",
    tag = "Roles",
    request_body = CreateRoleRequest,
    responses(
        (status = 201, description = "Role created", body = Object),
        (status = 400, description = "Unknown permission or missing name"),
        (status = 409, description = "Role name already in use")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn create_role(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiJson(request): ApiJson<CreateRoleRequest>,
) -> ApiResult<Role> {
    auth.require_any(MANAGE)?;
    Ok(ApiResponse::created(state.roles.create(request).await?))
}

/// PUT /role - Update name, description or permissions
#[utoipa::path(
    put,
    path = "/role",
    tag = "Roles",
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = Object),
        (status = 404, description = "Role not found")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn update_role(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiJson(request): ApiJson<UpdateRoleRequest>,
) -> ApiResult<Role> {
    auth.require_any(MANAGE)?;
    Ok(ApiResponse::ok(state.roles.update(request).await?))
}

/// DELETE /role/{id} - Delete a role and detach it from users
#[utoipa::path(
    delete,
    path = "/role/{id}",
    tag = "Roles",
    params(("id" = Uuid, Path, description = "Role id")),
    responses(
        (status = 200, description = "Role deleted", body = Object),
        (status = 404, description = "Role not found")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn delete_role(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Uuid> {
    auth.require_any(MANAGE)?;
    state.roles.delete(id).await?;
    Ok(ApiResponse::ok(id))
}

pub async fn delete_role_by_query(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> ApiResult<Uuid> {
    auth.require_any(MANAGE)?;
    state.roles.delete(query.id).await?;
    Ok(ApiResponse::ok(query.id))
}

/// PUT /role/permissions - Replace a role's permissions
#[utoipa::path(
    put,
    path = "/role/permissions",
    tag = "Roles",
    request_body = RolePermissionsRequest,
    responses(
        (status = 200, description = "Permissions replaced", body = Object),
        (status = 400, description = "Unknown permission")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn set_role_permissions(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiJson(request): ApiJson<RolePermissionsRequest>,
) -> ApiResult<Role> {
    auth.require_any(MANAGE)?;
    Ok(ApiResponse::ok(
        state.roles.set_permissions(request.id, request.permissions).await?,
    ))
}

/// POST /role/permissions/add - Grant permissions to a role
#[utoipa::path(
    post,
    path = "/role/permissions/add",
    tag = "Roles",
    request_body = RolePermissionsRequest,
    responses(
        (status = 200, description = "Permissions added", body = Object)
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn add_role_permissions(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiJson(request): ApiJson<RolePermissionsRequest>,
) -> ApiResult<Role> {
    auth.require_any(MANAGE)?;
    Ok(ApiResponse::ok(
        state.roles.add_permissions(request.id, request.permissions).await?,
    ))
}

/// POST /role/permissions/remove - Revoke permissions from a role
#[utoipa::path(
    post,
    path = "/role/permissions/remove",
    tag = "Roles",
    request_body = RolePermissionsRequest,
    responses(
        (status = 200, description = "Permissions removed", body = Object)
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn remove_role_permissions(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiJson(request): ApiJson<RolePermissionsRequest>,
) -> ApiResult<Role> {
    auth.require_any(MANAGE)?;
    Ok(ApiResponse::ok(
        state
            .roles
            .remove_permissions(request.id, request.permissions)
            .await?,
    ))
}

/// GET /role/permissions/catalog - Every permission a role may hold
#[utoipa::path(
    get,
    path = "/role/permissions/catalog",
    tag = "Roles",
    responses(
        (status = 200, description = "Permission names", body = Object)
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn permission_catalog(auth: AuthContext) -> ApiResult<Vec<&'static str>> {
    auth.require_any(READ)?;
    Ok(ApiResponse::ok(
        Permission::ALL.iter().map(Permission::as_str).collect(),
    ))
}

/// PUT /role/assign - Set the roles a user holds
#[utoipa::path(
    put,
    path = "/role/assign",
    tag = "Roles",
    request_body = AssignRolesRequest,
    responses(
        (status = 200, description = "Roles assigned", body = UserProfile),
        (status = 404, description = "User or role not found")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn assign_roles(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiJson(request): ApiJson<AssignRolesRequest>,
) -> ApiResult<UserProfile> {
    auth.require_any(MANAGE)?;
    let resolved = state.roles.assign_roles(request.user_id, request.role_ids).await?;
    Ok(ApiResponse::ok(resolved.profile()))
}
