//! Index Integration Tests
//!
//! Idempotent updates of the picker index.

use stickerpack::core::{add_all_to_index, add_to_index, PackIndex, INDEX_FILENAME};
use tempfile::TempDir;

#[test]
fn test_add_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(INDEX_FILENAME);

    assert!(add_to_index(dir.path(), "cats.json", Some("https://hs.example")).unwrap());
    let first = std::fs::read(&path).unwrap();

    assert!(!add_to_index(dir.path(), "cats.json", Some("https://hs.example")).unwrap());
    assert_eq!(std::fs::read(&path).unwrap(), first);

    let index = PackIndex::load(&path);
    assert_eq!(index.packs, vec!["cats.json"]);
    assert_eq!(index.homeserver_url.as_deref(), Some("https://hs.example"));
}

#[test]
fn test_insertion_order_kept() {
    let dir = TempDir::new().unwrap();
    add_to_index(dir.path(), "b.json", None).unwrap();
    add_to_index(dir.path(), "a.json", None).unwrap();
    add_all_to_index(dir.path(), ["c.json", "b.json"], None).unwrap();

    let index = PackIndex::load(&dir.path().join(INDEX_FILENAME));
    assert_eq!(index.packs, vec!["b.json", "a.json", "c.json"]);
}

#[test]
fn test_homeserver_written_with_first_new_entry() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(INDEX_FILENAME);
    std::fs::write(&path, r#"{"packs": ["old.json"]}"#).unwrap();

    // No new entry: nothing is written, even though a homeserver is known
    assert!(!add_to_index(dir.path(), "old.json", Some("https://hs.example")).unwrap());
    assert!(PackIndex::load(&path).homeserver_url.is_none());

    assert!(add_to_index(dir.path(), "new.json", Some("https://hs.example")).unwrap());
    let index = PackIndex::load(&path);
    assert_eq!(index.packs, vec!["old.json", "new.json"]);
    assert_eq!(index.homeserver_url.as_deref(), Some("https://hs.example"));

    // An existing homeserver is never replaced
    add_to_index(dir.path(), "third.json", Some("https://other.example")).unwrap();
    assert_eq!(
        PackIndex::load(&path).homeserver_url.as_deref(),
        Some("https://hs.example")
    );
}

#[test]
fn test_corrupt_index_starts_over() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(INDEX_FILENAME);
    std::fs::write(&path, "{ this is not json").unwrap();

    assert_eq!(PackIndex::load(&path), PackIndex::default());
    assert!(add_to_index(dir.path(), "cats.json", None).unwrap());
    assert_eq!(PackIndex::load(&path).packs, vec!["cats.json"]);
}

#[test]
fn test_concurrent_publishers_keep_every_entry() {
    let dir = TempDir::new().unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let dir = dir.path().to_path_buf();
            std::thread::spawn(move || add_to_index(&dir, &format!("pack{i}.json"), None).unwrap())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut packs = PackIndex::load(&dir.path().join(INDEX_FILENAME)).packs;
    packs.sort();
    assert_eq!(packs.len(), 8);
    assert_eq!(packs[0], "pack0.json");
}
