//! Storage layer tests against the in-memory backend

use form_platform_api::models::{Form, LocalizedText};
use form_platform_api::storage::{
    Collection, MemoryStorageBackend, Repository, StorageBackend, StorageError,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

fn forms() -> Repository<Form> {
    Repository::new(Arc::new(MemoryStorageBackend::new()))
}

fn form(title: &str) -> Form {
    Form::new(vec![LocalizedText::new("en", title)])
}

#[tokio::test]
async fn test_create_and_get_round_trip() {
    let repo = forms();
    let created = repo.create(form("Survey")).await.unwrap();

    assert_eq!(created.meta.version, 1);
    let fetched = repo.get(created.id()).await.unwrap();
    assert_eq!(fetched.title, created.title);
    assert_eq!(fetched.meta.created_at, created.meta.created_at);
}

#[tokio::test]
async fn test_get_missing_is_not_found() {
    let repo = forms();
    let err = repo.get(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound { .. }));
    assert!(repo.find(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_is_newest_first() {
    let repo = forms();
    let first = repo.create(form("First")).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = repo.create(form("Second")).await.unwrap();

    let ids: Vec<Uuid> = repo.list().await.unwrap().iter().map(|f| f.id()).collect();
    assert_eq!(ids, vec![second.id(), first.id()]);
}

#[tokio::test]
async fn test_update_bumps_version() {
    let repo = forms();
    let mut created = repo.create(form("Survey")).await.unwrap();
    created.description = "Updated".to_string();

    let updated = repo.update(created, Some(1)).await.unwrap();
    assert_eq!(updated.meta.version, 2);
    assert_eq!(updated.description, "Updated");
}

#[tokio::test]
async fn test_stale_update_is_version_conflict() {
    let repo = forms();
    let created = repo.create(form("Survey")).await.unwrap();

    let mut first = created.clone();
    first.description = "first writer".to_string();
    repo.update(first, Some(1)).await.unwrap();

    let mut second = created;
    second.description = "second writer".to_string();
    let err = repo.update(second, Some(1)).await.unwrap_err();
    assert!(err.is_version_conflict());

    let stored = repo.get(err_id(&err)).await.unwrap();
    assert_eq!(stored.description, "first writer");
}

fn err_id(err: &StorageError) -> Uuid {
    match err {
        StorageError::VersionConflict { entity_id, .. } => entity_id.parse().unwrap(),
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_unconditional_update_ignores_version() {
    let repo = forms();
    let created = repo.create(form("Survey")).await.unwrap();
    repo.update(created.clone(), None).await.unwrap();
    let updated = repo.update(created, None).await.unwrap();
    assert_eq!(updated.meta.version, 3);
}

#[tokio::test]
async fn test_modify_applies_change() {
    let repo = forms();
    let created = repo.create(form("Survey")).await.unwrap();

    let modified = repo
        .modify(created.id(), |f: &mut Form| {
            f.can_duplicate = true;
            Ok::<(), StorageError>(())
        })
        .await
        .unwrap();

    assert!(modified.can_duplicate);
    assert_eq!(modified.meta.version, 2);
}

#[tokio::test]
async fn test_delete_and_delete_where() {
    let repo = forms();
    let keep = repo.create(form("Keep")).await.unwrap();
    let mut drop_a = form("Drop");
    drop_a.can_duplicate = true;
    let mut drop_b = form("Drop too");
    drop_b.can_duplicate = true;
    repo.create(drop_a).await.unwrap();
    repo.create(drop_b).await.unwrap();

    assert_eq!(repo.delete_where(|f| f.can_duplicate).await.unwrap(), 2);
    assert_eq!(repo.list().await.unwrap().len(), 1);

    assert!(repo.delete(keep.id()).await.unwrap());
    assert!(!repo.delete(keep.id()).await.unwrap());
}

#[tokio::test]
async fn test_backend_rejects_duplicate_insert() {
    let backend = MemoryStorageBackend::new();
    let id = Uuid::new_v4();
    backend
        .insert_document(Collection::Forms, id, json!({"title": "a"}))
        .await
        .unwrap();

    let err = backend
        .insert_document(Collection::Forms, id, json!({"title": "b"}))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Duplicate { .. }));
}

#[tokio::test]
async fn test_collections_are_isolated() {
    let backend = MemoryStorageBackend::new();
    let id = Uuid::new_v4();
    backend
        .insert_document(Collection::Forms, id, json!({}))
        .await
        .unwrap();

    assert!(
        backend
            .get_document(Collection::Responses, id)
            .await
            .unwrap()
            .is_none()
    );
    assert_eq!(backend.list_documents(Collection::Forms).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_skips_undecodable_documents() {
    let backend = Arc::new(MemoryStorageBackend::new());
    let legacy = Uuid::new_v4();
    backend
        .insert_document(Collection::Forms, legacy, json!({"legacy": true}))
        .await
        .unwrap();
    let repo: Repository<Form> = Repository::new(backend);
    let kept = repo.create(form("Kept")).await.unwrap();

    let listed = repo.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id(), kept.id());

    assert!(matches!(
        repo.get(legacy).await.unwrap_err(),
        StorageError::Serialization(_)
    ));
}
