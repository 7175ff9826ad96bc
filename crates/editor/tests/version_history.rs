mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use h2space_core::error::CoreError;
use h2space_core::versions::{ChangeKind, FieldChange};
use h2space_editor::{DraftEdit, DraftStateManager, VersionHistoryManager};

use common::{bus, sample_content, FakeRepository};

/// Content `c1` with versions 1..=4 whose titles are One..Four.
async fn history_fixture() -> (Arc<FakeRepository>, DraftStateManager) {
    let repo = FakeRepository::new();
    repo.seed(sample_content("c1", "One"));
    let content = repo.content("c1").unwrap();
    let draft = DraftStateManager::load(repo.clone(), bus(), Some(&content));
    for title in ["Two", "Three", "Four"] {
        draft.edit(DraftEdit::Title(title.into())).await;
        draft.save(false).await.unwrap();
    }
    (repo, draft)
}

#[tokio::test]
async fn versions_are_listed_newest_first_with_current_flag() {
    let (repo, _draft) = history_fixture().await;
    let history = VersionHistoryManager::new(repo, "c1");

    let versions = history.list_versions().await.unwrap();
    let numbers: Vec<u32> = versions.iter().map(|v| v.version_number).collect();
    assert_eq!(numbers, vec![4, 3, 2, 1]);
    assert_eq!(history.current().await.as_deref(), Some("c1-v4"));
    assert!(history.is_current("c1-v4").await);
    assert!(!history.is_current("c1-v3").await);
}

#[tokio::test]
async fn unknown_content_has_empty_history() {
    let history = VersionHistoryManager::new(FakeRepository::new(), "missing");
    assert!(history.list_versions().await.unwrap().is_empty());
    assert!(history.current().await.is_none());
}

#[tokio::test]
async fn third_selection_keeps_last_two_picks() {
    let (repo, _draft) = history_fixture().await;
    let history = VersionHistoryManager::new(repo, "c1");

    history.select("c1-v1").await;
    history.select("c1-v3").await;
    let selected = history.select("c1-v2").await;
    assert_eq!(selected, vec!["c1-v3".to_string(), "c1-v2".to_string()]);

    let deselected = history.select("c1-v3").await;
    assert_eq!(deselected, vec!["c1-v2".to_string()]);
}

#[tokio::test]
async fn compare_returns_later_versions_changes() {
    let (repo, _draft) = history_fixture().await;
    let history = VersionHistoryManager::new(repo, "c1");

    let comparison = history.compare("c1-v4", "c1-v2").await.unwrap();
    assert_eq!(comparison.earlier.version_number, 2);
    assert_eq!(comparison.later.version_number, 4);
    assert_eq!(
        comparison.changes,
        vec![FieldChange::new("title", ChangeKind::Modified)]
    );
}

#[tokio::test]
async fn compare_sees_versions_saved_after_listing() {
    let (repo, draft) = history_fixture().await;
    let history = VersionHistoryManager::new(repo.clone(), "c1");
    assert_eq!(history.list_versions().await.unwrap().len(), 4);

    draft.edit(DraftEdit::Title("Five".into())).await;
    draft.save(false).await.unwrap();

    let comparison = history.compare("c1-v5", "c1-v4").await.unwrap();
    assert_eq!(comparison.later.version_number, 5);
    assert_eq!(
        comparison.changes,
        vec![FieldChange::new("title", ChangeKind::Modified)]
    );
    assert_eq!(history.current().await.as_deref(), Some("c1-v5"));
}

#[tokio::test]
async fn compare_requires_two_distinct_known_versions() {
    let (repo, _draft) = history_fixture().await;
    let history = VersionHistoryManager::new(repo, "c1");

    assert_matches!(
        history.compare("c1-v2", "c1-v2").await,
        Err(CoreError::Validation(_))
    );
    assert_matches!(
        history.compare("c1-v2", "c1-v9").await,
        Err(CoreError::NotFound { entity: "version", id }) if id == "c1-v9"
    );

    history.select("c1-v1").await;
    assert_matches!(history.compare_selected().await, Err(CoreError::Validation(_)));

    history.select("c1-v3").await;
    let comparison = history.compare_selected().await.unwrap();
    assert_eq!(comparison.later.id, "c1-v3");
}

#[tokio::test]
async fn restore_then_save_appends_a_new_version() {
    let (repo, draft) = history_fixture().await;
    let history = VersionHistoryManager::new(repo.clone(), "c1");
    let v3_before = repo.versions_of("c1")[2].clone();

    let restored = history.restore("c1-v3").await.unwrap();
    assert_eq!(restored.id.as_deref(), Some("c1"));
    assert_eq!(restored.fields, v3_before.data);
    assert_eq!(repo.versions_of("c1").len(), 4);

    draft.apply_restored(restored).await;
    assert!(draft.is_dirty().await);
    draft.save(false).await.unwrap();

    let versions = repo.versions_of("c1");
    assert_eq!(versions.len(), 5);
    assert_eq!(versions[2], v3_before);
    assert_eq!(versions[4].data.title, "Three");
    assert_eq!(repo.content("c1").unwrap().title, "Three");
}

#[tokio::test]
async fn restoring_current_version_is_allowed() {
    let (repo, draft) = history_fixture().await;
    let history = VersionHistoryManager::new(repo, "c1");

    let restored = history.restore("c1-v4").await.unwrap();
    draft.apply_restored(restored).await;
    assert!(!draft.is_dirty().await);
}

#[tokio::test]
async fn restoring_unknown_version_is_not_found() {
    let (repo, _draft) = history_fixture().await;
    let history = VersionHistoryManager::new(repo, "c1");
    assert_matches!(
        history.restore("c1-v42").await,
        Err(CoreError::NotFound { .. })
    );
}
