//! Integration tests for the user registry on a real directory mount
//!
//! Run with: cargo test --package keytag-storage --test registry_persistence

use keytag_core::TagId;
use keytag_storage::{FileStorage, StorageError, User, UserRegistry, codec};
use std::fs;
use tempfile::TempDir;

const REGISTRY_FILE: &str = "users.json";

fn tag(text: &str) -> TagId {
    TagId::parse(text).unwrap()
}

fn open(dir: &TempDir) -> UserRegistry<FileStorage> {
    UserRegistry::open(FileStorage::new(dir.path()), REGISTRY_FILE).unwrap()
}

fn read_document(dir: &TempDir) -> String {
    fs::read_to_string(dir.path().join(REGISTRY_FILE)).unwrap()
}

#[test]
fn test_first_boot_creates_empty_document() {
    let dir = TempDir::new().unwrap();

    let registry = open(&dir);

    assert!(registry.is_empty());
    assert_eq!(read_document(&dir), "[]");
}

#[test]
fn test_enroll_lookup_revoke_scenario() {
    let dir = TempDir::new().unwrap();
    let mut registry = open(&dir);

    registry.add("Alice", tag("04A1B2C3")).unwrap();
    registry.add("Bob", tag("04D4E5F6")).unwrap();

    assert_eq!(registry.find(&tag("04A1B2C3")).unwrap().name, "Alice");
    assert_eq!(
        codec::load(&read_document(&dir)).unwrap(),
        vec![
            User::new("Alice", tag("04A1B2C3")),
            User::new("Bob", tag("04D4E5F6")),
        ]
    );

    let removed = registry.remove(&tag("04A1B2C3")).unwrap();
    assert_eq!(removed.unwrap().name, "Alice");
    assert!(registry.find(&tag("04A1B2C3")).is_none());
    assert_eq!(
        codec::load(&read_document(&dir)).unwrap(),
        vec![User::new("Bob", tag("04D4E5F6"))]
    );
}

#[test]
fn test_registry_survives_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let mut registry = open(&dir);
        registry.add("Alice", tag("04A1B2C3")).unwrap();
        registry.add("Bob", tag("04D4E5F6")).unwrap();
    }

    let registry = open(&dir);

    let names: Vec<_> = registry.list().map(|u| u.name.clone()).collect();
    assert_eq!(names, vec!["Alice", "Bob"]);
    assert_eq!(registry.find(&tag("04D4E5F6")).unwrap().name, "Bob");
}

#[test]
fn test_document_written_by_older_firmware_loads() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(REGISTRY_FILE),
        r#"[{"name":"Alice","nfc_id":"04A1B2C3"},{"name":"Old badge","nfc_id":"4a1b2c"}]"#,
    )
    .unwrap();

    let registry = open(&dir);

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.find(&tag("04A1B2C3")).unwrap().name, "Alice");
    // Ids from the document are kept verbatim
    assert_eq!(registry.list().nth(1).unwrap().tag_id.as_str(), "4a1b2c");
}

#[test]
fn test_corrupted_document_is_backed_up() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(REGISTRY_FILE), "not json at all").unwrap();

    let registry = open(&dir);

    assert!(registry.is_empty());
    assert_eq!(read_document(&dir), "[]");

    let backups: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("users.json.corrupted."))
        .collect();
    assert_eq!(backups.len(), 1);
    assert_eq!(
        fs::read_to_string(dir.path().join(&backups[0])).unwrap(),
        "not json at all"
    );
}

#[test]
fn test_duplicate_enrollment_leaves_document_unchanged() {
    let dir = TempDir::new().unwrap();
    let mut registry = open(&dir);
    registry.add("Alice", tag("04A1B2C3")).unwrap();
    let before = read_document(&dir);

    let result = registry.add("Bob", tag("04a1b2c3"));

    assert!(matches!(result, Err(StorageError::DuplicateTag { .. })));
    assert_eq!(read_document(&dir), before);
}

#[test]
fn test_failed_write_keeps_memory_and_document_in_sync() {
    let dir = TempDir::new().unwrap();
    let mut registry = open(&dir);
    registry.add("Alice", tag("04A1B2C3")).unwrap();

    // Block the temp file so the next write fails
    fs::create_dir(dir.path().join("users.json.tmp")).unwrap();

    let result = registry.add("Bob", tag("04D4E5F6"));

    assert!(result.unwrap_err().is_persistence());
    assert!(registry.find(&tag("04D4E5F6")).is_none());
    assert_eq!(
        codec::load(&read_document(&dir)).unwrap(),
        vec![User::new("Alice", tag("04A1B2C3"))]
    );
}
