//! Question bank routes.

use axum::{Router, extract::State, routing::get};
use serde::Deserialize;
use uuid::Uuid;

use super::IdQuery;
use super::app_state::AppState;
use super::auth_context::AuthContext;
use super::error::{ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult};
use crate::middleware::permissions::Permission;
use crate::models::SavedQuestion;
use crate::services::question_service::{SavedQuestionInput, SavedQuestionUpdate};

#[derive(Debug, Default, Deserialize)]
struct QuestionQuery {
    tag: Option<String>,
}

const READ: &[Permission] = &[Permission::ViewQuestions, Permission::ManageQuestions];
const WRITE: &[Permission] = &[Permission::ManageQuestions];

pub fn questions_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_questions)
                .post(create_question)
                .put(update_question)
                .delete(delete_question_by_query),
        )
        .route("/{id}", get(get_question).delete(delete_question))
}

async fn list_questions(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiQuery(query): ApiQuery<QuestionQuery>,
) -> ApiResult<Vec<SavedQuestion>> {
    auth.require_any(READ)?;
    Ok(ApiResponse::ok(
        state.questions.list(query.tag.as_deref()).await?,
    ))
}

async fn get_question(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<SavedQuestion> {
    auth.require_any(READ)?;
    Ok(ApiResponse::ok(state.questions.get(id).await?))
}

async fn create_question(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiJson(input): ApiJson<SavedQuestionInput>,
) -> ApiResult<SavedQuestion> {
    auth.require_any(WRITE)?;
    Ok(ApiResponse::created(state.questions.create(input).await?))
}

async fn update_question(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiJson(update): ApiJson<SavedQuestionUpdate>,
) -> ApiResult<SavedQuestion> {
    auth.require_any(WRITE)?;
    Ok(ApiResponse::ok(state.questions.update(update).await?))
}

async fn delete_question(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Uuid> {
    auth.require_any(WRITE)?;
    state.questions.delete(id).await?;
    Ok(ApiResponse::ok(id))
}

async fn delete_question_by_query(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> ApiResult<Uuid> {
    auth.require_any(WRITE)?;
    state.questions.delete(query.id).await?;
    Ok(ApiResponse::ok(query.id))
}
