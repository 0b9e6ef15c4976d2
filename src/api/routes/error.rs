//! API error handling and the response envelope.
//!
//! Every response body, success or failure, has the shape
//! `{ code, message, data, timestamp }`. The first three digits of `code`
//! are the HTTP status.

use crate::services::ServiceError;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

/// Numeric result codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    Ok = 20000,
    Created = 20100,
    Validation = 40000,
    Unauthenticated = 40100,
    Forbidden = 40300,
    NotFound = 40400,
    Conflict = 40900,
    TooManyRequests = 42900,
    Internal = 50000,
}

impl ResponseCode {
    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn status(self) -> StatusCode {
        StatusCode::from_u16((self.code() / 100) as u16).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Default message for the code.
    pub fn message(self) -> &'static str {
        match self {
            ResponseCode::Ok => "Success",
            ResponseCode::Created => "Created successfully",
            ResponseCode::Validation => "Invalid request",
            ResponseCode::Unauthenticated => "Unauthorized: please login",
            ResponseCode::Forbidden => "Forbidden",
            ResponseCode::NotFound => "Not found",
            ResponseCode::Conflict => "Conflict",
            ResponseCode::TooManyRequests => "Too many requests, try again later",
            ResponseCode::Internal => "Internal server error",
        }
    }
}

/// The response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub code: u32,
    pub message: String,
    pub data: T,
    pub timestamp: DateTime<Utc>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(code: ResponseCode, message: impl Into<String>, data: T) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data,
            timestamp: Utc::now(),
        }
    }

    pub fn ok(data: T) -> Self {
        Self::new(ResponseCode::Ok, ResponseCode::Ok.message(), data)
    }

    pub fn created(data: T) -> Self {
        Self::new(ResponseCode::Created, ResponseCode::Created.message(), data)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16((self.code / 100) as u16)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, axum::Json(self)).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

/// HTTP-facing errors.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("Invalid answers")]
    InvalidAnswers(Vec<String>),
    #[error("{0}")]
    Unauthenticated(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Too many requests")]
    RateLimited,
    /// Detail is logged, never returned.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn code(&self) -> ResponseCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidAnswers(_) => ResponseCode::Validation,
            ApiError::Unauthenticated(_) => ResponseCode::Unauthenticated,
            ApiError::Forbidden(_) => ResponseCode::Forbidden,
            ApiError::NotFound(_) => ResponseCode::NotFound,
            ApiError::Conflict(_) => ResponseCode::Conflict,
            ApiError::RateLimited => ResponseCode::TooManyRequests,
            ApiError::Internal(_) => ResponseCode::Internal,
        }
    }

    pub fn unauthenticated() -> Self {
        ApiError::Unauthenticated(ResponseCode::Unauthenticated.message().to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (message, data) = match self {
            ApiError::Internal(detail) => {
                error!("Internal error: {}", detail);
                (code.message().to_string(), Value::Null)
            }
            ApiError::InvalidAnswers(problems) => {
                debug!("Rejected answers: {:?}", problems);
                ("Invalid answers".to_string(), Value::from(problems))
            }
            ApiError::RateLimited => (code.message().to_string(), Value::Null),
            other => {
                debug!("Request failed with {}: {}", code.code(), other);
                (other.to_string(), Value::Null)
            }
        };
        ApiResponse::new(code, message, data).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            ServiceError::IllegalTransition { .. }
            | ServiceError::NotAcceptingResponses(_)
            | ServiceError::Conflict(_) => ApiError::Conflict(e.to_string()),
            ServiceError::InvalidSchedule | ServiceError::Validation(_) => {
                ApiError::Validation(e.to_string())
            }
            ServiceError::DuplicationForbidden(_) | ServiceError::Forbidden(_) => {
                ApiError::Forbidden(e.to_string())
            }
            ServiceError::InvalidAnswers(errors) => {
                ApiError::InvalidAnswers(errors.iter().map(|e| e.to_string()).collect())
            }
            ServiceError::Unauthorized(message) => ApiError::Unauthenticated(message),
            ServiceError::Storage(_) | ServiceError::Internal(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

/// JSON body extractor whose failures render as envelopes.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor whose failures render as envelopes.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Path extractor whose failures render as envelopes.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);
