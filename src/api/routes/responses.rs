//! Response routes: submission, retrieval, editing and export.

use axum::{
    Router,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::IdQuery;
use super::app_state::AppState;
use super::auth_context::{AuthContext, MaybeAuth};
use super::error::{ApiError, ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult};
use crate::middleware::permissions::Permission;
use crate::models::FormResponse;
use crate::services::ExportFormat;
use crate::services::export_service::{build_json, build_table, export_file_name, to_csv};
use crate::services::response_service::{SubmitRequest, UpdateResponseRequest};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FormIdQuery {
    form_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserIdQuery {
    user_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
struct DownloadQuery {
    #[serde(default)]
    format: ExportFormat,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportLinkRequest {
    form_id: Uuid,
    #[serde(default)]
    user_id: Option<Uuid>,
    #[serde(default)]
    format: ExportFormat,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportLink {
    url: String,
    token: String,
    expires_at: DateTime<Utc>,
}

const READ: &[Permission] = &[Permission::ViewResponses];

pub fn responses_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_responses))
        .route("/getByFormId", get(list_by_form))
        .route("/getByUserId", get(list_by_user))
        .route("/getById", get(get_response))
        .route("/submit", post(submit_response))
        .route("/update", patch(update_response))
        .route("/delete", delete(delete_response))
        .route("/deleteByFormId", delete(delete_by_form))
        .route("/download/{form_id}", get(download_form))
        .route("/download/{form_id}/user/{user_id}", get(download_user))
        .route("/export/link", post(create_export_link))
}

async fn list_responses(State(state): State<AppState>, auth: AuthContext) -> ApiResult<Vec<FormResponse>> {
    auth.require_any(READ)?;
    Ok(ApiResponse::ok(state.responses.list().await?))
}

async fn list_by_form(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiQuery(query): ApiQuery<FormIdQuery>,
) -> ApiResult<Vec<FormResponse>> {
    auth.require_any(READ)?;
    Ok(ApiResponse::ok(state.responses.list_by_form(query.form_id).await?))
}

/// Callers may always list their own responses.
async fn list_by_user(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiQuery(query): ApiQuery<UserIdQuery>,
) -> ApiResult<Vec<FormResponse>> {
    if query.user_id != auth.user_id {
        auth.require_any(READ)?;
    }
    Ok(ApiResponse::ok(state.responses.list_by_user(query.user_id).await?))
}

async fn get_response(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> ApiResult<FormResponse> {
    let response = state.responses.get(query.id).await?;
    if response.responder != Some(auth.user_id) {
        auth.require_any(READ)?;
    }
    Ok(ApiResponse::ok(response))
}

async fn submit_response(
    State(state): State<AppState>,
    MaybeAuth(auth): MaybeAuth,
    ApiJson(request): ApiJson<SubmitRequest>,
) -> ApiResult<FormResponse> {
    let responder = auth.map(|a| a.user_id);
    let response = state.responses.submit(request, responder, Utc::now()).await?;
    Ok(ApiResponse::created(response))
}

async fn update_response(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiJson(request): ApiJson<UpdateResponseRequest>,
) -> ApiResult<FormResponse> {
    auth.require_any(&[Permission::EditResponses])?;
    Ok(ApiResponse::ok(state.responses.update(request).await?))
}

async fn delete_response(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> ApiResult<Uuid> {
    auth.require_any(&[Permission::DeleteResponses])?;
    state.responses.delete(query.id).await?;
    Ok(ApiResponse::ok(query.id))
}

async fn delete_by_form(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiQuery(query): ApiQuery<FormIdQuery>,
) -> ApiResult<serde_json::Value> {
    auth.require_any(&[Permission::DeleteResponses])?;
    let removed = state.responses.delete_by_form(query.form_id).await?;
    Ok(ApiResponse::ok(serde_json::json!({
        "formId": query.form_id,
        "deleted": removed,
    })))
}

async fn download_form(
    State(state): State<AppState>,
    MaybeAuth(auth): MaybeAuth,
    ApiPath(form_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<DownloadQuery>,
) -> Result<Response, ApiError> {
    export_download(&state, auth, form_id, None, query).await
}

async fn download_user(
    State(state): State<AppState>,
    MaybeAuth(auth): MaybeAuth,
    ApiPath((form_id, user_id)): ApiPath<(Uuid, Uuid)>,
    ApiQuery(query): ApiQuery<DownloadQuery>,
) -> Result<Response, ApiError> {
    export_download(&state, auth, form_id, Some(user_id), query).await
}

/// A download needs either a signed export link for this form or a
/// caller holding EXPORT_RESPONSES.
async fn export_download(
    state: &AppState,
    auth: Option<AuthContext>,
    form_id: Uuid,
    user_id: Option<Uuid>,
    query: DownloadQuery,
) -> Result<Response, ApiError> {
    match (&query.token, &auth) {
        (Some(token), _) => {
            state
                .jwt
                .validate_export_token(token, form_id, user_id)
                .map_err(|e| {
                    warn!("Rejected export token for form {}: {}", form_id, e);
                    ApiError::Forbidden("Export link is invalid or expired".to_string())
                })?;
        }
        (None, Some(auth)) => auth.require_any(&[Permission::ExportResponses])?,
        (None, None) => return Err(ApiError::unauthenticated()),
    }

    let (form, responses) = state.responses.for_export(form_id, user_id).await?;
    let body = match query.format {
        ExportFormat::Csv => to_csv(&build_table(&form, &responses))?,
        ExportFormat::Json => serde_json::to_string_pretty(&build_json(&form, &responses, Utc::now()))
            .map_err(|e| ApiError::Internal(format!("Failed to serialize export: {}", e)))?,
    };

    info!(
        "Exported {} response(s) of form {} as {}",
        responses.len(),
        form_id,
        query.format.extension()
    );

    Ok((
        [
            (header::CONTENT_TYPE, query.format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export_file_name(&form, query.format)),
            ),
        ],
        body,
    )
        .into_response())
}

/// Mint a short-lived download URL that works without a session.
async fn create_export_link(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiJson(request): ApiJson<ExportLinkRequest>,
) -> ApiResult<ExportLink> {
    auth.require_any(&[Permission::ExportResponses])?;
    state.forms.find(request.form_id).await?;

    let issued = state
        .jwt
        .generate_export_token(auth.user_id, request.form_id, request.user_id)
        .map_err(ApiError::Internal)?;

    let mut path = format!(
        "{}/api/v1/response/download/{}",
        state.config.public_base_url.trim_end_matches('/'),
        request.form_id
    );
    if let Some(user_id) = request.user_id {
        path.push_str(&format!("/user/{}", user_id));
    }
    let url = format!(
        "{}?format={}&token={}",
        path,
        request.format.extension(),
        issued.token
    );

    Ok(ApiResponse::ok(ExportLink {
        url,
        token: issued.token,
        expires_at: issued.expires_at,
    }))
}
