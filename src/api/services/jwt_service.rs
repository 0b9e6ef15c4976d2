//! JWT Service for token generation and validation.
//!
//! Two kinds of token are issued:
//! - Access tokens: carried in the HTTP-only `token` cookie (or a Bearer
//!   header) and identify the signed-in user.
//! - Export tokens: short-lived, bound to one form (and optionally one
//!   responder), embedded in shareable download links.

use crate::config::AppConfig;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Token type: "access" or "export"
    pub token_type: TokenType,
    /// Form an export token is bound to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_id: Option<Uuid>,
    /// Responder an export token is restricted to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_user: Option<Uuid>,
}

impl Claims {
    /// Parsed subject.
    pub fn user_id(&self) -> Result<Uuid, String> {
        Uuid::parse_str(&self.sub).map_err(|_| "Invalid token subject".to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Export,
}

/// A freshly signed token and its expiry.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// JWT Service configuration
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_duration: Duration,
    export_token_duration: Duration,
}

impl JwtService {
    /// Create a new JWT service with the given secret and lifetimes.
    pub fn new(secret: &str, access_token_duration: Duration, export_token_duration: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_duration,
            export_token_duration,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.jwt_secret, config.token_ttl, config.export_link_ttl)
    }

    /// Sign an access token for a user.
    pub fn generate_access_token(&self, user_id: Uuid) -> Result<IssuedToken, String> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(self.access_token_duration)
            .ok_or_else(|| "Access token expiry out of range".to_string())?;
        let claims = Claims {
            sub: user_id.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            token_type: TokenType::Access,
            form_id: None,
            target_user: None,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| format!("Failed to encode access token: {}", e))?;

        debug!("Generated access token for user {}, expires: {}", user_id, exp);

        Ok(IssuedToken {
            token,
            expires_at: exp,
        })
    }

    /// Sign an export token allowing `user_id` to download the responses
    /// of `form_id`, optionally restricted to one responder.
    pub fn generate_export_token(
        &self,
        user_id: Uuid,
        form_id: Uuid,
        target_user: Option<Uuid>,
    ) -> Result<IssuedToken, String> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(self.export_token_duration)
            .ok_or_else(|| "Export token expiry out of range".to_string())?;
        let claims = Claims {
            sub: user_id.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            token_type: TokenType::Export,
            form_id: Some(form_id),
            target_user,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| format!("Failed to encode export token: {}", e))?;

        debug!(
            "Generated export token for form {} by user {}, expires: {}",
            form_id, user_id, exp
        );

        Ok(IssuedToken {
            token,
            expires_at: exp,
        })
    }

    /// Validate an access token and return the claims
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, String> {
        let token_data = self.decode_token(token)?;

        if token_data.claims.token_type != TokenType::Access {
            return Err("Invalid token type: expected access token".to_string());
        }

        Ok(token_data.claims)
    }

    /// Validate an export token for a specific form and responder filter.
    pub fn validate_export_token(
        &self,
        token: &str,
        form_id: Uuid,
        target_user: Option<Uuid>,
    ) -> Result<Claims, String> {
        let token_data = self.decode_token(token)?;
        let claims = token_data.claims;

        if claims.token_type != TokenType::Export {
            return Err("Invalid token type: expected export token".to_string());
        }
        if claims.form_id != Some(form_id) {
            return Err("Export token was issued for another form".to_string());
        }
        if claims.target_user.is_some() && claims.target_user != target_user {
            return Err("Export token was issued for another responder".to_string());
        }

        Ok(claims)
    }

    /// Decode and validate a token (checks signature and expiration)
    fn decode_token(&self, token: &str) -> Result<TokenData<Claims>, String> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => "Token has expired".to_string(),
            jsonwebtoken::errors::ErrorKind::InvalidToken => "Invalid token format".to_string(),
            jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                "Invalid token signature".to_string()
            }
            _ => format!("Token validation failed: {}", e),
        })
    }

    /// Extract bearer token from Authorization header
    pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
        auth_header.strip_prefix("Bearer ")
    }
}

/// Shared JWT service for use across the application
pub type SharedJwtService = Arc<JwtService>;
