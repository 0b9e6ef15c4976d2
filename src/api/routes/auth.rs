//! Authentication routes.
//!
//! Login issues a signed access token in an HTTP-only `token` cookie and
//! also returns it in the body for non-browser clients. Logout clears the
//! cookie; the token itself simply expires.

use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use super::app_state::AppState;
use super::auth_context::{AuthContext, TOKEN_COOKIE};
use super::error::{ApiError, ApiJson, ApiResponse, ApiResult};
use crate::middleware::rate_limit::try_acquire;
use crate::models::UserProfile;
use crate::services::auth_service::{LoginRequest, RegisterRequest};

/// Successful login payload.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserProfile,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    let same_site = if state.config.cookie_secure {
        SameSite::None
    } else {
        SameSite::Lax
    };
    Cookie::build((TOKEN_COOKIE, token))
        .http_only(true)
        .secure(state.config.cookie_secure)
        .same_site(same_site)
        .path("/")
        .build()
}

/// POST /auth/login - Check credentials and set the session cookie
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; token cookie set", body = LoginResponse),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Invalid email or password"),
        (status = 429, description = "Too many login attempts")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<(CookieJar, ApiResponse<LoginResponse>), ApiError> {
    if !try_acquire(&state.login_limiter) {
        warn!("Login rate limit exceeded");
        return Err(ApiError::RateLimited);
    }

    let resolved = state.auth.login(request).await?;
    let issued = state
        .jwt
        .generate_access_token(resolved.user.id())
        .map_err(ApiError::Internal)?;

    info!("User {} logged in", resolved.user.id());

    let jar = jar.add(session_cookie(&state, issued.token.clone()));
    Ok((
        jar,
        ApiResponse::ok(LoginResponse {
            user: resolved.profile(),
            token: issued.token,
            expires_at: issued.expires_at,
        }),
    ))
}

/// POST /auth/register - Create an account with the default role
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserProfile),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Email already in use")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> ApiResult<UserProfile> {
    let resolved = state.auth.register(request).await?;
    Ok(ApiResponse::created(resolved.profile()))
}

/// POST /auth/logout - Clear the session cookie
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Authentication",
    responses(
        (status = 200, description = "Cookie cleared")
    )
)]
pub async fn logout(jar: CookieJar) -> (CookieJar, ApiResponse<()>) {
    let jar = jar.remove(Cookie::build(TOKEN_COOKIE).path("/"));
    (
        jar,
        ApiResponse::new(
            super::error::ResponseCode::Ok,
            "Logged out successfully",
            (),
        ),
    )
}

/// GET /auth/me - Profile of the signed-in user
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Authentication",
    responses(
        (status = 200, description = "Current user", body = UserProfile),
        (status = 401, description = "Not signed in")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn me(auth: AuthContext) -> ApiResult<UserProfile> {
    Ok(ApiResponse::ok(auth.profile()))
}
