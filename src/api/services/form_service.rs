//! Form aggregate operations: CRUD, status changes, duplication and
//! lineage.

use crate::models::{
    Form, FormResponse, FormSettings, FormStatus, LocalizedText, Question, QuestionKind, Schedule,
    walk_questions,
};
use crate::models::localized::deserialize_localized;
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::lineage::{LineageEntry, LineageGraph};
use crate::services::status_policy::{allowed_transitions, check_transition, effective_status};
use crate::storage::{Repository, StorageBackend};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Mutable fields of a form as sent by clients on create and update.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormInput {
    #[serde(deserialize_with = "deserialize_localized")]
    pub title: Vec<LocalizedText>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub status: Option<FormStatus>,
    #[serde(default)]
    pub schedule: Schedule,
    #[serde(default)]
    pub settings: FormSettings,
    #[serde(default)]
    pub can_duplicate: bool,
}

/// Full replacement of a form's mutable fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormUpdate {
    pub id: Uuid,
    /// Version the client last read; when set, the update fails with a
    /// conflict if the form changed since.
    #[serde(default)]
    pub version: Option<i32>,
    #[serde(flatten)]
    pub input: FormInput,
}

/// A form as returned to clients, with derived fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    #[serde(flatten)]
    pub form: Form,
    pub effective_status: FormStatus,
    pub allowed_transitions: Vec<FormStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children_forms: Option<Vec<LineageEntry>>,
}

impl FormView {
    pub fn new(form: Form, now: DateTime<Utc>) -> Self {
        Self {
            effective_status: effective_status(form.status, &form.schedule, now),
            allowed_transitions: allowed_transitions(form.status),
            form,
            children_forms: None,
        }
    }
}

/// What an anonymous responder sees of an open form.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicFormView {
    pub id: Uuid,
    pub title: Vec<LocalizedText>,
    pub description: String,
    pub questions: Vec<Question>,
    pub settings: FormSettings,
    pub effective_status: FormStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormLineage {
    pub form_id: Uuid,
    pub ancestors: Vec<LineageEntry>,
    pub descendants: Vec<LineageEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormFilter {
    /// Matches on effective status.
    #[serde(default)]
    pub status: Option<FormStatus>,
    #[serde(default)]
    pub owner_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct FormService {
    forms: Repository<Form>,
    responses: Repository<FormResponse>,
}

impl FormService {
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self {
            forms: Repository::new(storage.clone()),
            responses: Repository::new(storage),
        }
    }

    pub fn repository(&self) -> &Repository<Form> {
        &self.forms
    }

    pub async fn list(&self, filter: &FormFilter, now: DateTime<Utc>) -> ServiceResult<Vec<FormView>> {
        let forms = self
            .forms
            .list_where(|f| filter.owner_id.is_none_or(|owner| f.owner_id == Some(owner)))
            .await?;

        Ok(forms
            .into_iter()
            .map(|f| FormView::new(f, now))
            .filter(|v| filter.status.is_none_or(|s| v.effective_status == s))
            .collect())
    }

    /// A single form with its computed `childrenForms` (all descendants).
    pub async fn get(&self, id: Uuid, now: DateTime<Utc>) -> ServiceResult<FormView> {
        let all = self.forms.list().await?;
        let graph = LineageGraph::build(&all);
        let descendants = graph.descendants(id);

        let form = all
            .into_iter()
            .find(|f| f.id() == id)
            .ok_or_else(|| ServiceError::not_found("Form", id))?;

        let mut view = FormView::new(form, now);
        view.children_forms = Some(descendants);
        Ok(view)
    }

    pub async fn find(&self, id: Uuid) -> ServiceResult<Form> {
        Ok(self.forms.get(id).await?)
    }

    /// Create a form. It starts as a draft; a requested initial status must
    /// be reachable from draft.
    pub async fn create(&self, input: FormInput, owner_id: Option<Uuid>) -> ServiceResult<Form> {
        validate_input(&input)?;
        let status = input.status.unwrap_or(FormStatus::Draft);
        check_transition(FormStatus::Draft, status)?;

        let mut form = Form::new(input.title);
        form.description = input.description;
        form.questions = input.questions;
        form.status = status;
        form.schedule = input.schedule;
        form.settings = input.settings;
        form.can_duplicate = input.can_duplicate;
        form.owner_id = owner_id;

        let form = self.forms.create(form).await?;
        info!("Created form {} ({})", form.id(), form.status);
        Ok(form)
    }

    /// Replace the mutable fields of a form. The status change is checked
    /// against the transition table.
    pub async fn update(&self, update: FormUpdate) -> ServiceResult<Form> {
        validate_input(&update.input)?;

        let mut form = self.forms.get(update.id).await?;
        let expected = update.version.unwrap_or(form.meta.version);
        let input = update.input;

        if let Some(next) = input.status {
            check_transition(form.status, next)?;
            form.status = next;
        }
        form.title = input.title;
        form.description = input.description;
        form.questions = input.questions;
        form.schedule = input.schedule;
        form.settings = input.settings;
        form.can_duplicate = input.can_duplicate;

        let form = self.forms.update(form, Some(expected)).await?;
        info!("Updated form {} (version {})", form.id(), form.meta.version);
        Ok(form)
    }

    /// Change only the stored status.
    pub async fn set_status(&self, id: Uuid, next: FormStatus) -> ServiceResult<Form> {
        self.forms
            .modify(id, |form: &mut Form| {
                check_transition(form.status, next)?;
                form.status = next;
                Ok(())
            })
            .await
    }

    /// Delete a form and every response collected for it.
    pub async fn delete(&self, id: Uuid) -> ServiceResult<usize> {
        if !self.forms.delete(id).await? {
            return Err(ServiceError::not_found("Form", id));
        }
        let removed = self.responses.delete_where(|r| r.form == id).await?;
        info!("Deleted form {} and {} response(s)", id, removed);
        Ok(removed)
    }

    /// Clone a form as a new draft. Only drafts that allow duplication can
    /// be cloned.
    pub async fn duplicate(&self, id: Uuid, owner_id: Option<Uuid>) -> ServiceResult<Form> {
        let source = self.forms.get(id).await?;

        if !source.can_duplicate {
            return Err(ServiceError::DuplicationForbidden(
                "this form does not allow duplication".to_string(),
            ));
        }
        if source.status != FormStatus::Draft {
            return Err(ServiceError::DuplicationForbidden(format!(
                "only draft forms can be duplicated (status '{}')",
                source.status
            )));
        }

        let copy = self.forms.create(source.duplicate(owner_id)).await?;
        info!("Duplicated form {} as {}", id, copy.id());
        Ok(copy)
    }

    pub async fn lineage(&self, id: Uuid) -> ServiceResult<FormLineage> {
        let all = self.forms.list().await?;
        if !all.iter().any(|f| f.id() == id) {
            return Err(ServiceError::not_found("Form", id));
        }
        let graph = LineageGraph::build(&all);
        Ok(FormLineage {
            form_id: id,
            ancestors: graph.ancestors(id),
            descendants: graph.descendants(id),
        })
    }

    /// The responder-facing view; only available while the form is open.
    pub async fn public_view(&self, id: Uuid, now: DateTime<Utc>) -> ServiceResult<PublicFormView> {
        let form = self.forms.get(id).await?;
        let status = effective_status(form.status, &form.schedule, now);
        if status != FormStatus::Open {
            return Err(ServiceError::NotAcceptingResponses(status));
        }

        Ok(PublicFormView {
            id: form.id(),
            title: form.title,
            description: form.description,
            questions: form.questions,
            settings: form.settings,
            effective_status: status,
        })
    }

    /// Record a response id on its form. Failure is logged, not returned.
    pub async fn link_response(&self, form_id: Uuid, response_id: Uuid) {
        let linked = self
            .forms
            .modify(form_id, |form: &mut Form| {
                if !form.responses.contains(&response_id) {
                    form.responses.push(response_id);
                }
                Ok::<(), ServiceError>(())
            })
            .await;
        if let Err(e) = linked {
            warn!("Failed to link response {} to form {}: {}", response_id, form_id, e);
        }
    }

    /// Drop response ids from their form. Failure is logged, not returned.
    pub async fn unlink_responses(&self, form_id: Uuid, response_ids: &[Uuid]) {
        let unlinked = self
            .forms
            .modify(form_id, |form: &mut Form| {
                form.responses.retain(|r| !response_ids.contains(r));
                Ok::<(), ServiceError>(())
            })
            .await;
        if let Err(e) = unlinked {
            warn!("Failed to unlink responses from form {}: {}", form_id, e);
        }
    }
}

fn validate_input(input: &FormInput) -> ServiceResult<()> {
    if input.title.iter().all(|t| t.value.trim().is_empty()) {
        return Err(ServiceError::validation("Field title is required"));
    }
    if !input.schedule.is_valid() {
        return Err(ServiceError::InvalidSchedule);
    }
    if input.settings.limit_responses && input.settings.max_responses == 0 {
        return Err(ServiceError::validation(
            "Field settings.maxResponses must be at least 1",
        ));
    }
    validate_questions(&input.questions)
}

/// Structural checks on a question tree: unique ids and sane type
/// configuration.
pub fn validate_questions(questions: &[Question]) -> ServiceResult<()> {
    let mut ids = HashSet::new();

    for node in walk_questions(questions) {
        let question = node.question;
        if question.id.trim().is_empty() {
            return Err(ServiceError::validation("Question id cannot be empty"));
        }
        if !ids.insert(question.id.as_str()) {
            return Err(ServiceError::validation(format!(
                "Question id '{}' is used more than once",
                question.id
            )));
        }

        match &question.kind {
            QuestionKind::Rating { min, max, step } => {
                if min >= max {
                    return Err(ServiceError::validation(format!(
                        "Rating question '{}' needs min < max",
                        question.id
                    )));
                }
                if *step <= 0.0 {
                    return Err(ServiceError::validation(format!(
                        "Rating question '{}' needs a positive step",
                        question.id
                    )));
                }
            }
            QuestionKind::Checkbox { options, .. } | QuestionKind::Choices { options } => {
                if options.is_empty() {
                    return Err(ServiceError::validation(format!(
                        "Question '{}' needs at least one option",
                        question.id
                    )));
                }
                let mut texts = HashSet::new();
                for option in options {
                    if option.text.trim().is_empty() || !texts.insert(option.text.as_str()) {
                        return Err(ServiceError::validation(format!(
                            "Question '{}' has an empty or repeated option",
                            question.id
                        )));
                    }
                }
            }
            QuestionKind::File { max_files, .. } if *max_files == 0 => {
                return Err(ServiceError::validation(format!(
                    "File question '{}' must accept at least one file",
                    question.id
                )));
            }
            _ => {}
        }
    }
    Ok(())
}
