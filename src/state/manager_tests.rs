//! Tests for StateManager

use super::*;
use tempfile::tempdir;

#[test]
fn test_state_manager_in_memory() {
    let manager = StateManager::in_memory();
    assert!(manager.is_in_memory());
}

#[tokio::test]
async fn test_pages_and_partitions() {
    let manager = StateManager::in_memory();

    manager.set_page("campaign_report_open_list", "123", 2).await;
    manager.set_page("campaign_report_open_list", "123", 3).await;
    manager
        .mark_partition_completed("campaign_report_open_list", "456")
        .await;

    assert_eq!(
        manager.get_page("campaign_report_open_list", "123").await,
        Some(3)
    );
    assert!(
        manager
            .is_partition_completed("campaign_report_open_list", "456")
            .await
    );
    assert!(
        !manager
            .is_partition_completed("campaign_report_open_list", "123")
            .await
    );
}

#[tokio::test]
async fn test_save_and_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");

    let manager = StateManager::from_file(&path).unwrap();
    assert!(!manager.is_in_memory());
    manager.set_page("campaign_report_open_list", "123", 4).await;
    manager
        .set_currently_syncing(Some("campaign_report_open_list"))
        .await;
    manager.save().await.unwrap();

    assert!(path.exists());
    assert!(!path.with_extension("tmp").exists());

    let reloaded = StateManager::from_file(&path).unwrap();
    assert_eq!(
        reloaded.get_page("campaign_report_open_list", "123").await,
        Some(4)
    );
    assert_eq!(
        reloaded.snapshot().await.currently_syncing.as_deref(),
        Some("campaign_report_open_list")
    );
}

#[tokio::test]
async fn test_in_memory_save_is_noop() {
    let manager = StateManager::in_memory();
    manager.set_page("campaign_list", "default", 1).await;
    manager.save().await.unwrap();
}

#[tokio::test]
async fn test_from_json() {
    let manager = StateManager::from_json(
        r#"{"bookmarks": {"campaign_list": {"partitions": {"default": {"page": 2}}}}}"#,
    )
    .unwrap();
    assert!(manager.is_in_memory());
    assert!(manager.snapshot().await.bookmarks.contains_key("campaign_list"));

    let empty = StateManager::from_json("  ").unwrap();
    assert!(empty.is_in_memory());
}

#[test]
fn test_from_json_invalid() {
    let err = StateManager::from_json("{not json").unwrap_err();
    assert!(matches!(err, crate::error::Error::State { .. }));
}

#[test]
fn test_from_file_invalid() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "[1, 2").unwrap();

    assert!(StateManager::from_file(&path).is_err());
}

#[tokio::test]
async fn test_clones_share_state() {
    let manager = StateManager::in_memory();
    let clone = manager.clone();

    clone.set_page("campaign_list", "default", 5).await;
    assert_eq!(manager.get_page("campaign_list", "default").await, Some(5));
}
