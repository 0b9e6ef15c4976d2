//! Response collection.

use crate::models::{Answer, Audience, Form, FormResponse, FormStatus};
use crate::services::answer_validator::validate_answers;
use crate::services::auth_service::is_valid_email;
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::form_service::FormService;
use crate::services::status_policy::effective_status;
use crate::storage::{Repository, StorageBackend};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    #[serde(alias = "form")]
    pub form_id: Uuid,
    #[serde(default)]
    pub answers: Vec<Answer>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResponseRequest {
    pub id: Uuid,
    #[serde(default)]
    pub version: Option<i32>,
    pub answers: Vec<Answer>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Clone)]
pub struct ResponseService {
    responses: Repository<FormResponse>,
    forms: FormService,
}

impl ResponseService {
    pub fn new(storage: Arc<dyn StorageBackend>, forms: FormService) -> Self {
        Self {
            responses: Repository::new(storage),
            forms,
        }
    }

    /// Store a submission after checking the form accepts it.
    pub async fn submit(
        &self,
        request: SubmitRequest,
        responder: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> ServiceResult<FormResponse> {
        let form = self.forms.find(request.form_id).await?;

        let status = effective_status(form.status, &form.schedule, now);
        if status != FormStatus::Open {
            return Err(ServiceError::NotAcceptingResponses(status));
        }
        if form.settings.who_can_respond == Audience::Authenticated && responder.is_none() {
            return Err(ServiceError::Unauthorized(
                "This form only accepts responses from signed-in users".to_string(),
            ));
        }

        let email = normalize_email(request.email)?;
        if form.settings.collect_emails && email.is_none() {
            return Err(ServiceError::validation("Field email is required for this form"));
        }

        if form.settings.limit_responses {
            let collected = self.count_for_form(form.id()).await?;
            if collected >= form.settings.max_responses as usize {
                return Err(ServiceError::Conflict(
                    "This form has reached its response limit".to_string(),
                ));
            }
        }

        validate_answers(&form, &request.answers).map_err(ServiceError::InvalidAnswers)?;

        let mut response = FormResponse::new(form.id(), responder, request.answers);
        response.email = email;
        response.submitted_at = request.submitted_at.unwrap_or(now);

        let response = self.responses.create(response).await?;
        info!("Stored response {} for form {}", response.id(), form.id());

        self.forms.link_response(form.id(), response.id()).await;
        Ok(response)
    }

    pub async fn list(&self) -> ServiceResult<Vec<FormResponse>> {
        Ok(self.responses.list().await?)
    }

    pub async fn list_by_form(&self, form_id: Uuid) -> ServiceResult<Vec<FormResponse>> {
        Ok(self.responses.list_where(|r| r.form == form_id).await?)
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> ServiceResult<Vec<FormResponse>> {
        Ok(self
            .responses
            .list_where(|r| r.responder == Some(user_id))
            .await?)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<FormResponse> {
        Ok(self.responses.get(id).await?)
    }

    /// Responses of one form oldest first, optionally from one responder.
    pub async fn for_export(&self, form_id: Uuid, responder: Option<Uuid>) -> ServiceResult<(Form, Vec<FormResponse>)> {
        let form = self.forms.find(form_id).await?;
        let mut responses = self
            .responses
            .list_where(|r| r.form == form_id && responder.is_none_or(|u| r.responder == Some(u)))
            .await?;
        responses.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
        Ok((form, responses))
    }

    /// Replace the answers of a stored response, re-validated against the
    /// current form. Editing is allowed whatever the form's status.
    pub async fn update(&self, request: UpdateResponseRequest) -> ServiceResult<FormResponse> {
        let mut response = self.responses.get(request.id).await?;
        let form = self.forms.find(response.form).await?;

        validate_answers(&form, &request.answers).map_err(ServiceError::InvalidAnswers)?;

        let expected = request.version.unwrap_or(response.meta.version);
        response.answers = request.answers;
        if request.email.is_some() {
            response.email = normalize_email(request.email)?;
        }

        Ok(self.responses.update(response, Some(expected)).await?)
    }

    pub async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        let response = self.responses.get(id).await?;
        self.responses.delete(id).await?;
        self.forms.unlink_responses(response.form, &[id]).await;
        info!("Deleted response {}", id);
        Ok(())
    }

    /// Delete every response of a form; returns how many were removed.
    pub async fn delete_by_form(&self, form_id: Uuid) -> ServiceResult<usize> {
        let responses = self.list_by_form(form_id).await?;
        let ids: Vec<Uuid> = responses.iter().map(|r| r.id()).collect();
        for id in &ids {
            self.responses.delete(*id).await?;
        }
        self.forms.unlink_responses(form_id, &ids).await;
        info!("Deleted {} response(s) of form {}", ids.len(), form_id);
        Ok(ids.len())
    }

    async fn count_for_form(&self, form_id: Uuid) -> ServiceResult<usize> {
        Ok(self.list_by_form(form_id).await?.len())
    }
}

fn normalize_email(email: Option<String>) -> ServiceResult<Option<String>> {
    match email.map(|e| e.trim().to_lowercase()).filter(|e| !e.is_empty()) {
        Some(email) if !is_valid_email(&email) => {
            Err(ServiceError::validation("Field email is not a valid address"))
        }
        other => Ok(other),
    }
}
