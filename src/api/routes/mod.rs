//! API routes module - organizes all route handlers.
//!
//! Everything is served under `/api/v1`; `/health` is also exposed at the
//! root for load balancers.

pub mod app_state;
pub mod auth;
pub mod auth_context;
pub mod error;
pub mod forms;
pub mod openapi;
pub mod questions;
pub mod responses;
pub mod roles;

use axum::{Router, extract::State, routing::get};
use serde::Deserialize;
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::warn;
use uuid::Uuid;

pub use app_state::AppState;
pub use error::{ApiError, ApiResponse, ApiResult};

use crate::middleware::cors::cors_layer_for;

/// `?id=` query used by the delete and lookup endpoints.
#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Uuid,
}

/// Create the main API router combining all route modules.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .nest("/auth", auth::auth_router())
        .nest("/form", forms::forms_router())
        .nest("/question", questions::questions_router())
        .nest("/response", responses::responses_router())
        .nest("/role", roles::roles_router())
        .merge(openapi::openapi_router())
}

/// The complete application: API under `/api/v1`, tracing and CORS.
pub fn build_app(state: AppState) -> Router {
    let cors = cors_layer_for(&state.config.cors_origins);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", create_api_router())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

async fn health_check(State(state): State<AppState>) -> ApiResponse<Value> {
    let storage = match state.storage.ping().await {
        Ok(()) => "ok",
        Err(e) => {
            warn!("Storage health check failed: {}", e);
            "unavailable"
        }
    };
    ApiResponse::ok(json!({
        "status": "ok",
        "service": "form-platform-api",
        "version": env!("CARGO_PKG_VERSION"),
        "storage": storage,
    }))
}
