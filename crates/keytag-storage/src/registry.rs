//! Persisted registry of enrolled users.
//!
//! [`UserRegistry`] keeps the enrolled users in memory, in insertion order,
//! and mirrors every change to a single document on a [`Storage`] mount.
//!
//! # Consistency
//!
//! A mutation is complete only once the new document has been written. If
//! the write fails the in-memory state is rolled back, so memory always
//! matches the last document that reached storage and lookups keep working
//! against it.
//!
//! # Example
//!
//! ```
//! use keytag_core::TagId;
//! use keytag_storage::{MemoryStorage, UserRegistry};
//!
//! # fn example() -> keytag_storage::StorageResult<()> {
//! let mut registry = UserRegistry::open(MemoryStorage::new(), "users.json")?;
//! let tag = TagId::parse("04A1B2C3").unwrap();
//!
//! registry.add("Alice", tag.clone())?;
//! assert_eq!(registry.find(&tag).map(|u| u.name.as_str()), Some("Alice"));
//!
//! registry.remove(&tag)?;
//! assert!(registry.find(&tag).is_none());
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use crate::codec;
use crate::error::{StorageError, StorageResult};
use crate::models::User;
use crate::mount::Storage;
use keytag_core::TagId;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Timestamp format used to name backups of undecodable documents.
const BACKUP_DATE_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Ordered set of enrolled users mirrored to storage.
#[derive(Debug)]
pub struct UserRegistry<S: Storage> {
    storage: S,
    path: PathBuf,
    users: Vec<User>,
}

impl<S: Storage> UserRegistry<S> {
    /// Open the registry document at `path`.
    ///
    /// - No document: the registry starts empty and `[]` is written at once.
    /// - Valid document: its users are loaded in order.
    /// - Undecodable document: the failure is logged, the document is copied
    ///   to `<path>.corrupted.<timestamp>` and the registry starts empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be read, or if the initial empty
    /// document cannot be written.
    pub fn open(mut storage: S, path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();

        let loaded = match storage.read_all(&path)? {
            None => {
                info!(path = %path.display(), "No registry document, creating an empty one");
                None
            }
            Some(bytes) => match decode_document(&bytes) {
                Ok(users) => Some(users),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Registry document is corrupted, starting empty");
                    backup_corrupted(&mut storage, &path, &bytes);
                    None
                }
            },
        };

        let needs_write = loaded.is_none();
        let mut registry = Self {
            storage,
            path,
            users: loaded.unwrap_or_default(),
        };

        if needs_write {
            registry.persist()?;
        } else {
            registry.warn_on_duplicates();
        }

        info!(
            count = registry.users.len(),
            path = %registry.path.display(),
            "Registry loaded"
        );

        Ok(registry)
    }

    /// Find the user enrolled with `tag_id`.
    pub fn find(&self, tag_id: &TagId) -> Option<&User> {
        let found = self.users.iter().find(|user| &user.tag_id == tag_id);

        match found {
            Some(user) => debug!(tag_id = %tag_id, name = %user.name, "User found"),
            None => debug!(tag_id = %tag_id, "User not found"),
        }

        found
    }

    /// Enroll a new user and persist the registry.
    ///
    /// The name is trimmed before it is stored.
    ///
    /// # Errors
    ///
    /// - `StorageError::InvalidName` if the trimmed name is empty
    /// - `StorageError::DuplicateTag` if `tag_id` is already enrolled
    /// - `StorageError::Persistence` if the document could not be written;
    ///   the user is not added in that case
    pub fn add(&mut self, name: &str, tag_id: TagId) -> StorageResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StorageError::InvalidName);
        }

        if self.users.iter().any(|user| user.tag_id == tag_id) {
            return Err(StorageError::DuplicateTag { tag_id });
        }

        self.users.push(User::new(name, tag_id));

        if let Err(e) = self.persist() {
            self.users.pop();
            return Err(e);
        }

        info!(name = %name, count = self.users.len(), "User enrolled");
        Ok(())
    }

    /// Remove the user enrolled with `tag_id` and persist the registry.
    ///
    /// Returns the removed user, or `None` if the tag was not enrolled (in
    /// which case nothing is written).
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Persistence` if the document could not be
    /// written; the user is restored at its original position in that case.
    pub fn remove(&mut self, tag_id: &TagId) -> StorageResult<Option<User>> {
        let Some(index) = self.users.iter().position(|user| &user.tag_id == tag_id) else {
            info!(tag_id = %tag_id, "User not found, nothing to remove");
            return Ok(None);
        };

        let removed = self.users.remove(index);

        if let Err(e) = self.persist() {
            self.users.insert(index, removed);
            return Err(e);
        }

        info!(name = %removed.name, tag_id = %tag_id, "User removed");
        Ok(Some(removed))
    }

    /// Iterate over enrolled users in insertion order.
    ///
    /// Each call starts a fresh iteration.
    pub fn list(&self) -> std::slice::Iter<'_, User> {
        self.users.iter()
    }

    /// Number of enrolled users
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether no user is enrolled
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Encode the registry as a document
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Encode` if serialization fails.
    pub fn to_text(&self) -> StorageResult<String> {
        codec::to_text(&self.users)
    }

    /// Path of the registry document on the storage mount
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Underlying storage
    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn persist(&mut self) -> StorageResult<()> {
        let text = self.to_text()?;

        self.storage
            .write_all(&self.path, text.as_bytes())
            .inspect_err(|e| error!(path = %self.path.display(), error = %e, "Failed to persist registry"))
    }

    fn warn_on_duplicates(&self) {
        for (i, user) in self.users.iter().enumerate() {
            if self.users[..i].iter().any(|u| u.tag_id == user.tag_id) {
                warn!(
                    tag_id = %user.tag_id,
                    name = %user.name,
                    "Duplicate tag in registry document, only the first entry matches"
                );
            }
        }
    }
}

fn decode_document(bytes: &[u8]) -> StorageResult<Vec<User>> {
    let text = std::str::from_utf8(bytes).map_err(|e| StorageError::Decode(e.to_string()))?;
    codec::load(text)
}

fn backup_corrupted<S: Storage>(storage: &mut S, path: &Path, bytes: &[u8]) {
    let timestamp = chrono::Utc::now().format(BACKUP_DATE_FORMAT);
    let backup_path = PathBuf::from(format!("{}.corrupted.{timestamp}", path.display()));

    match storage.write_all(&backup_path, bytes) {
        Ok(()) => warn!(backup = %backup_path.display(), "Backed up corrupted registry document"),
        Err(e) => warn!(error = %e, "Could not back up corrupted registry document"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mount::MemoryStorage;

    const PATH: &str = "users.json";

    fn tag(text: &str) -> TagId {
        TagId::parse(text).unwrap()
    }

    fn open_empty() -> (UserRegistry<MemoryStorage>, MemoryStorage) {
        let storage = MemoryStorage::new();
        let registry = UserRegistry::open(storage.clone(), PATH).unwrap();
        (registry, storage)
    }

    fn persisted(storage: &MemoryStorage) -> Vec<User> {
        codec::load(&storage.document(PATH).unwrap()).unwrap()
    }

    #[test]
    fn test_open_without_document_writes_empty_array() {
        let (registry, storage) = open_empty();

        assert!(registry.is_empty());
        assert_eq!(storage.document(PATH).as_deref(), Some("[]"));
    }

    #[test]
    fn test_open_loads_existing_document() {
        let storage = MemoryStorage::with_document(
            PATH,
            r#"[{"name": "Alice", "nfc_id": "04A1B2C3"}, {"name": "Bob", "nfc_id": "04D4E5F6"}]"#,
        );

        let registry = UserRegistry::open(storage, PATH).unwrap();

        let names: Vec<_> = registry.list().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob"]);
    }

    #[test]
    fn test_open_corrupted_document_starts_empty_with_backup() {
        let storage = MemoryStorage::with_document(PATH, "[{\"name\": ");

        let registry = UserRegistry::open(storage.clone(), PATH).unwrap();

        assert!(registry.is_empty());
        assert_eq!(storage.document(PATH).as_deref(), Some("[]"));

        let backups: Vec<_> = storage
            .paths()
            .into_iter()
            .filter(|p| p.to_string_lossy().starts_with("users.json.corrupted."))
            .collect();
        assert_eq!(backups.len(), 1);
        assert_eq!(storage.document(&backups[0]).as_deref(), Some("[{\"name\": "));
    }

    #[test]
    fn test_open_fails_when_initial_write_fails() {
        let storage = MemoryStorage::new();
        storage.set_fail_writes(true);

        let result = UserRegistry::open(storage, PATH);
        assert!(matches!(result, Err(StorageError::Persistence { .. })));
    }

    #[test]
    fn test_find_on_empty_registry() {
        let (registry, _) = open_empty();
        assert!(registry.find(&tag("04A1B2C3")).is_none());
    }

    #[test]
    fn test_add_then_find() {
        let (mut registry, storage) = open_empty();

        registry.add("Alice", tag("04A1B2C3")).unwrap();

        let user = registry.find(&tag("04A1B2C3")).unwrap();
        assert_eq!(user.name, "Alice");
        assert_eq!(persisted(&storage), vec![user.clone()]);
    }

    #[test]
    fn test_add_trims_name() {
        let (mut registry, _) = open_empty();

        registry.add("  Alice \n", tag("04A1B2C3")).unwrap();

        assert_eq!(registry.find(&tag("04A1B2C3")).unwrap().name, "Alice");
    }

    #[test]
    fn test_add_rejects_blank_name() {
        let (mut registry, storage) = open_empty();

        let result = registry.add("   ", tag("04A1B2C3"));

        assert!(matches!(result, Err(StorageError::InvalidName)));
        assert!(registry.is_empty());
        assert_eq!(storage.document(PATH).as_deref(), Some("[]"));
    }

    #[test]
    fn test_add_duplicate_tag_is_rejected() {
        let (mut registry, storage) = open_empty();
        registry.add("Alice", tag("04A1B2C3")).unwrap();

        let result = registry.add("Mallory", tag("04A1B2C3"));

        assert!(matches!(
            result,
            Err(StorageError::DuplicateTag { ref tag_id }) if *tag_id == tag("04A1B2C3")
        ));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.find(&tag("04A1B2C3")).unwrap().name, "Alice");
        assert_eq!(persisted(&storage).len(), 1);
    }

    #[test]
    fn test_add_rolls_back_on_write_failure() {
        let (mut registry, storage) = open_empty();
        registry.add("Alice", tag("04A1B2C3")).unwrap();
        storage.set_fail_writes(true);

        let result = registry.add("Bob", tag("04D4E5F6"));

        assert!(result.unwrap_err().is_persistence());
        assert!(registry.find(&tag("04D4E5F6")).is_none());
        assert_eq!(registry.len(), 1);
        assert_eq!(persisted(&storage).len(), 1);
    }

    #[test]
    fn test_remove_after_add() {
        let (mut registry, storage) = open_empty();
        registry.add("Alice", tag("04A1B2C3")).unwrap();

        let removed = registry.remove(&tag("04A1B2C3")).unwrap();

        assert_eq!(removed.map(|u| u.name), Some("Alice".to_string()));
        assert!(registry.find(&tag("04A1B2C3")).is_none());
        assert!(persisted(&storage).is_empty());
    }

    #[test]
    fn test_remove_missing_tag_is_noop() {
        let (mut registry, storage) = open_empty();
        registry.add("Alice", tag("04A1B2C3")).unwrap();
        storage.set_fail_writes(true);

        // No write is attempted, so the failing storage is never touched
        let removed = registry.remove(&tag("DEADBEEF")).unwrap();

        assert!(removed.is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_rolls_back_to_original_position() {
        let (mut registry, storage) = open_empty();
        registry.add("Alice", tag("04A1B2C3")).unwrap();
        registry.add("Bob", tag("04D4E5F6")).unwrap();
        registry.add("Carol", tag("0A0B0C0D")).unwrap();
        storage.set_fail_writes(true);

        let result = registry.remove(&tag("04D4E5F6"));

        assert!(result.unwrap_err().is_persistence());
        let names: Vec<_> = registry.list().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob", "Carol"]);
    }

    #[test]
    fn test_list_is_restartable() {
        let (mut registry, _) = open_empty();
        registry.add("Alice", tag("04A1B2C3")).unwrap();
        registry.add("Bob", tag("04D4E5F6")).unwrap();

        let first: Vec<_> = registry.list().collect();
        let second: Vec<_> = registry.list().collect();

        assert_eq!(first, second);
        assert_eq!(registry.list().len(), 2);
    }

    #[test]
    fn test_legacy_duplicates_match_first_entry() {
        let storage = MemoryStorage::with_document(
            PATH,
            r#"[{"name": "First", "nfc_id": "04A1B2C3"}, {"name": "Second", "nfc_id": "04A1B2C3"}]"#,
        );

        let registry = UserRegistry::open(storage, PATH).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.find(&tag("04A1B2C3")).unwrap().name, "First");
    }
}
