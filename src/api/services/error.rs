//! Domain errors raised by the service layer.

use crate::models::FormStatus;
use crate::services::answer_validator::AnswerError;
use crate::storage::StorageError;
use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Cannot change form status from '{from}' to '{to}'")]
    IllegalTransition { from: FormStatus, to: FormStatus },

    #[error("Schedule start must be before its end")]
    InvalidSchedule,

    #[error("Duplication forbidden: {0}")]
    DuplicationForbidden(String),

    #[error("Form is not accepting responses (status '{0}')")]
    NotAcceptingResponses(FormStatus),

    #[error("Invalid answers: {}", format_answer_errors(.0))]
    InvalidAnswers(Vec<AnswerError>),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Storage error: {0}")]
    Storage(StorageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        ServiceError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }
}

impl From<StorageError> for ServiceError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound {
                entity_type,
                entity_id,
            } => ServiceError::NotFound {
                entity: entity_label(&entity_type),
                id: entity_id,
            },
            StorageError::VersionConflict { .. } => ServiceError::Conflict(
                "The document was modified concurrently, reload and try again".to_string(),
            ),
            other => ServiceError::Storage(other),
        }
    }
}

fn entity_label(entity_type: &str) -> &'static str {
    match entity_type {
        "form" | "forms" => "Form",
        "question" | "questions" => "Question",
        "response" | "responses" => "Response",
        "role" | "roles" => "Role",
        "user" | "users" => "User",
        _ => "Document",
    }
}

fn format_answer_errors(errors: &[AnswerError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
