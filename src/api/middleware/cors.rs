//! CORS middleware configuration.

use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

/// Create a CORS layer with permissive settings for development.
///
/// This allows all origins, methods, and headers.
pub fn create_cors_layer() -> CorsLayer {
    CorsLayer::permissive()
}

/// Create a CORS layer restricted to the given origins.
///
/// Credentials are allowed so that the browser sends the session cookie.
/// Origins that are not valid header values are skipped with a warning.
pub fn create_custom_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true)
}

/// CORS layer for the configured origin list; empty means permissive.
pub fn cors_layer_for(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        create_cors_layer()
    } else {
        create_custom_cors_layer(origins)
    }
}
