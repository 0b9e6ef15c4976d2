//! Authentication context extractors.
//!
//! The access token is read from the `token` cookie, falling back to an
//! `Authorization: Bearer` header. The user is reloaded on every request so
//! role changes take effect immediately.

use super::app_state::AppState;
use super::error::ApiError;
use crate::middleware::permissions::{Permission, has_any_permission};
use crate::models::UserProfile;
use crate::services::ResolvedUser;
use crate::services::jwt_service::JwtService;
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};
use axum_extra::extract::CookieJar;
use std::collections::BTreeSet;
use tracing::warn;
use uuid::Uuid;

/// Name of the session cookie.
pub const TOKEN_COOKIE: &str = "token";

/// Authenticated caller.
#[derive(Clone, Debug)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role_names: Vec<String>,
    pub permissions: BTreeSet<String>,
}

impl AuthContext {
    /// Succeeds when the caller holds at least one of `required`.
    pub fn require_any(&self, required: &[Permission]) -> Result<(), ApiError> {
        if has_any_permission(&self.permissions, required) {
            Ok(())
        } else {
            warn!(
                "User {} lacks any of {:?}",
                self.user_id,
                required.iter().map(Permission::as_str).collect::<Vec<_>>()
            );
            Err(ApiError::Forbidden(
                "Forbidden: insufficient permissions".to_string(),
            ))
        }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.user_id,
            name: self.name.clone(),
            email: self.email.clone(),
            roles: self.role_names.clone(),
            permissions: self.permissions.iter().cloned().collect(),
        }
    }
}

impl From<ResolvedUser> for AuthContext {
    fn from(resolved: ResolvedUser) -> Self {
        Self {
            user_id: resolved.user.id(),
            name: resolved.user.name,
            email: resolved.user.email,
            role_names: resolved.role_names,
            permissions: resolved.permissions,
        }
    }
}

/// Token from the cookie, else from a Bearer header.
pub fn request_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(TOKEN_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(JwtService::extract_bearer_token)
        .map(str::to_string)
}

async fn authenticate(headers: &HeaderMap, state: &AppState) -> Result<Option<AuthContext>, ApiError> {
    let Some(token) = request_token(headers) else {
        return Ok(None);
    };

    let claims = state.jwt.validate_access_token(&token).map_err(|e| {
        warn!("JWT validation failed: {}", e);
        ApiError::unauthenticated()
    })?;
    let user_id = claims.user_id().map_err(|e| {
        warn!("{}", e);
        ApiError::unauthenticated()
    })?;

    match state.auth.load_user(user_id).await? {
        Some(resolved) => Ok(Some(resolved.into())),
        None => {
            warn!("Token subject {} no longer exists", user_id);
            Err(ApiError::unauthenticated())
        }
    }
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        authenticate(&parts.headers, state)
            .await?
            .ok_or_else(ApiError::unauthenticated)
    }
}

/// Caller identity for endpoints open to anonymous users. A present but
/// invalid token is still rejected.
#[derive(Clone, Debug)]
pub struct MaybeAuth(pub Option<AuthContext>);

impl FromRequestParts<AppState> for MaybeAuth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuth(authenticate(&parts.headers, state).await?))
    }
}
