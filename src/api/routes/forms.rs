//! Form routes: CRUD, status changes, duplication and lineage.

use axum::{
    Router,
    extract::State,
    routing::{get, post, put},
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use super::IdQuery;
use super::app_state::AppState;
use super::auth_context::AuthContext;
use super::error::{ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult};
use crate::middleware::permissions::Permission;
use crate::models::FormStatus;
use crate::services::form_service::{FormFilter, FormInput, FormLineage, FormUpdate, FormView, PublicFormView};

#[derive(Debug, Deserialize)]
struct StatusChange {
    status: FormStatus,
}

#[derive(Debug, Deserialize)]
struct DuplicateRequest {
    id: Uuid,
}

pub fn forms_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_forms)
                .post(create_form)
                .put(update_form)
                .delete(delete_form_by_query),
        )
        .route("/duplicate", post(duplicate_form))
        .route("/{id}", get(get_form).delete(delete_form))
        .route("/{id}/public", get(get_public_form))
        .route("/{id}/lineage", get(get_form_lineage))
        .route("/{id}/status", put(change_status))
}

const READ: &[Permission] = &[
    Permission::ViewForms,
    Permission::CreateForm,
    Permission::EditForm,
];

/// GET /form - List forms, newest first
#[utoipa::path(
    get,
    path = "/form",
    tag = "Forms",
    params(
        ("status" = Option<String>, Query, description = "Filter on effective status"),
        ("ownerId" = Option<Uuid>, Query, description = "Filter on owner")
    ),
    responses(
        (status = 200, description = "Forms with effective status", body = Object),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Missing VIEW_FORMS")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn list_forms(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiQuery(filter): ApiQuery<FormFilter>,
) -> ApiResult<Vec<FormView>> {
    auth.require_any(READ)?;
    Ok(ApiResponse::ok(state.forms.list(&filter, Utc::now()).await?))
}

/// GET /form/{id} - One form with its computed children
#[utoipa::path(
    get,
    path = "/form/{id}",
    tag = "Forms",
    params(("id" = Uuid, Path, description = "Form id")),
    responses(
        (status = 200, description = "Form", body = Object),
        (status = 404, description = "Form not found")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn get_form(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<FormView> {
    auth.require_any(READ)?;
    Ok(ApiResponse::ok(state.forms.get(id, Utc::now()).await?))
}

/// GET /form/{id}/public - Questions of an open form, no sign-in needed
#[utoipa::path(
    get,
    path = "/form/{id}/public",
    tag = "Forms",
    params(("id" = Uuid, Path, description = "Form id")),
    responses(
        (status = 200, description = "Form as shown to responders", body = Object),
        (status = 404, description = "Form not found"),
        (status = 409, description = "Form is not accepting responses")
    )
)]
pub async fn get_public_form(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<PublicFormView> {
    Ok(ApiResponse::ok(state.forms.public_view(id, Utc::now()).await?))
}

/// GET /form/{id}/lineage - Ancestors and all descendants of a form
#[utoipa::path(
    get,
    path = "/form/{id}/lineage",
    tag = "Forms",
    params(("id" = Uuid, Path, description = "Form id")),
    responses(
        (status = 200, description = "Duplication lineage", body = Object),
        (status = 404, description = "Form not found")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn get_form_lineage(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<FormLineage> {
    auth.require_any(READ)?;
    Ok(ApiResponse::ok(state.forms.lineage(id).await?))
}

/// POST /form - Create a form owned by the caller
#[utoipa::path(
    post,
    path = "/form",
    tag = "Forms",
    request_body = Object,
    responses(
        (status = 201, description = "Form created", body = Object),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Missing CREATE_FORM")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn create_form(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiJson(input): ApiJson<FormInput>,
) -> ApiResult<FormView> {
    auth.require_any(&[Permission::CreateForm])?;
    let form = state.forms.create(input, Some(auth.user_id)).await?;
    Ok(ApiResponse::created(FormView::new(form, Utc::now())))
}

/// PUT /form - Replace a form's editable fields
#[utoipa::path(
    put,
    path = "/form",
    tag = "Forms",
    request_body = Object,
    responses(
        (status = 200, description = "Form updated", body = Object),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Form not found"),
        (status = 409, description = "Illegal status change or stale version")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn update_form(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiJson(update): ApiJson<FormUpdate>,
) -> ApiResult<FormView> {
    auth.require_any(&[Permission::EditForm])?;
    let form = state.forms.update(update).await?;
    Ok(ApiResponse::ok(FormView::new(form, Utc::now())))
}

/// PUT /form/{id}/status - Change only the stored status
#[utoipa::path(
    put,
    path = "/form/{id}/status",
    tag = "Forms",
    params(("id" = Uuid, Path, description = "Form id")),
    request_body = Object,
    responses(
        (status = 200, description = "Status changed", body = Object),
        (status = 409, description = "Transition not allowed")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn change_status(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(change): ApiJson<StatusChange>,
) -> ApiResult<FormView> {
    auth.require_any(&[Permission::EditForm])?;
    let form = state.forms.set_status(id, change.status).await?;
    Ok(ApiResponse::ok(FormView::new(form, Utc::now())))
}

/// POST /form/duplicate - Clone a draft form
#[utoipa::path(
    post,
    path = "/form/duplicate",
    tag = "Forms",
    request_body = Object,
    responses(
        (status = 201, description = "Copy created", body = Object),
        (status = 403, description = "Duplication forbidden for this form"),
        (status = 404, description = "Form not found")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn duplicate_form(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiJson(request): ApiJson<DuplicateRequest>,
) -> ApiResult<FormView> {
    auth.require_any(&[Permission::DuplicateForm, Permission::CreateForm])?;
    let copy = state.forms.duplicate(request.id, Some(auth.user_id)).await?;
    Ok(ApiResponse::created(FormView::new(copy, Utc::now())))
}

/// DELETE /form/{id} - Delete a form and its responses
#[utoipa::path(
    delete,
    path = "/form/{id}",
    tag = "Forms",
    params(("id" = Uuid, Path, description = "Form id")),
    responses(
        (status = 200, description = "Form deleted", body = Object),
        (status = 404, description = "Form not found")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn delete_form(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<serde_json::Value> {
    remove_form(&state, &auth, id).await
}

/// DELETE /form?id= - Same as `DELETE /form/{id}`
pub async fn delete_form_by_query(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> ApiResult<serde_json::Value> {
    remove_form(&state, &auth, query.id).await
}

async fn remove_form(state: &AppState, auth: &AuthContext, id: Uuid) -> ApiResult<serde_json::Value> {
    auth.require_any(&[Permission::DeleteForm])?;
    let removed = state.forms.delete(id).await?;
    Ok(ApiResponse::ok(serde_json::json!({
        "id": id,
        "deletedResponses": removed,
    })))
}
