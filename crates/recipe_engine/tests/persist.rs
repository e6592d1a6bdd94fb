use std::fs;

use chrono::Utc;
use pretty_assertions::assert_eq;
use recipe_core::{Author, CrawlTarget};
use recipe_engine::{ensure_parent_dir, write_atomically, CrawlStore, MemoryStore};
use tempfile::TempDir;

#[test]
fn creates_missing_snapshot_dir() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("state").join("crawler.json");
    assert!(!path.parent().unwrap().exists());
    ensure_parent_dir(&path).unwrap();
    assert!(path.parent().unwrap().is_dir());
}

#[test]
fn atomic_write_replaces_existing() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("snapshot.json");

    write_atomically(&path, "hello").unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "hello");

    write_atomically(&path, "world").unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "world");
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
}

#[test]
fn no_partial_file_on_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let result = write_atomically(&file_path.join("snapshot.json"), "data");
    assert!(result.is_err());
    assert_eq!(fs::read_to_string(&file_path).unwrap(), "x");
}

#[tokio::test]
async fn store_round_trips_through_snapshot_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("crawler.json");

    let store = MemoryStore::new();
    let id = store
        .insert_target(CrawlTarget::parse("https://soup.example/a", Utc::now()).unwrap())
        .await
        .unwrap();
    store.save_author(&Author::new("Ada Cook")).await.unwrap();
    store.save(&path).await.unwrap();

    let restored = MemoryStore::load(&path).unwrap();
    assert_eq!(restored.snapshot().await, store.snapshot().await);
    assert_eq!(
        restored.target(id).await.unwrap().map(|t| t.url),
        Some("https://soup.example/a".to_string())
    );
    // Ids keep counting from where the saved store stopped.
    let next = restored
        .insert_target(CrawlTarget::parse("https://soup.example/b", Utc::now()).unwrap())
        .await
        .unwrap();
    assert_eq!(next, id + 1);
}

#[tokio::test]
async fn missing_snapshot_starts_empty() {
    let temp = TempDir::new().unwrap();
    let store = MemoryStore::load(&temp.path().join("absent.json")).unwrap();
    assert!(store.snapshot().await.targets.is_empty());
}
