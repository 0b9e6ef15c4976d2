//! Question bank: reusable question definitions kept apart from forms.

use crate::models::{DocumentMeta, Question, SavedQuestion};
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::form_service::validate_questions;
use crate::storage::{Repository, StorageBackend};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedQuestionInput {
    pub question: Question,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedQuestionUpdate {
    pub id: Uuid,
    #[serde(default)]
    pub version: Option<i32>,
    #[serde(flatten)]
    pub input: SavedQuestionInput,
}

#[derive(Clone)]
pub struct QuestionService {
    questions: Repository<SavedQuestion>,
}

impl QuestionService {
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self {
            questions: Repository::new(storage),
        }
    }

    /// All saved questions, optionally only those carrying `tag`.
    pub async fn list(&self, tag: Option<&str>) -> ServiceResult<Vec<SavedQuestion>> {
        Ok(self
            .questions
            .list_where(|q| tag.is_none_or(|t| q.tags.iter().any(|x| x.eq_ignore_ascii_case(t))))
            .await?)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<SavedQuestion> {
        Ok(self.questions.get(id).await?)
    }

    pub async fn create(&self, input: SavedQuestionInput) -> ServiceResult<SavedQuestion> {
        validate_questions(std::slice::from_ref(&input.question))?;
        let saved = self
            .questions
            .create(SavedQuestion {
                meta: DocumentMeta::new(),
                question: input.question,
                tags: normalize_tags(input.tags),
            })
            .await?;
        info!("Saved question {} to the bank", saved.meta.id);
        Ok(saved)
    }

    pub async fn update(&self, update: SavedQuestionUpdate) -> ServiceResult<SavedQuestion> {
        validate_questions(std::slice::from_ref(&update.input.question))?;
        let mut saved = self.questions.get(update.id).await?;
        let expected = update.version.unwrap_or(saved.meta.version);
        saved.question = update.input.question;
        saved.tags = normalize_tags(update.input.tags);
        Ok(self.questions.update(saved, Some(expected)).await?)
    }

    pub async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        if self.questions.delete(id).await? {
            Ok(())
        } else {
            Err(ServiceError::not_found("Question", id))
        }
    }
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut tags: Vec<String> = tags
        .into_iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    tags.sort();
    tags.dedup();
    tags
}
