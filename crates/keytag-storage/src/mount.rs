//! Storage mount abstraction.
//!
//! The registry only needs two operations from the filesystem: read a whole
//! document and replace a whole document. [`FileStorage`] implements them on
//! a directory (the flash mount point on the device), [`MemoryStorage`] keeps
//! documents in memory for tests and can be told to fail writes.

use crate::error::{StorageError, StorageResult};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Whole-document storage used by the registry.
pub trait Storage: Send {
    /// Read the document at `path`.
    ///
    /// Returns `Ok(None)` if no document exists.
    fn read_all(&self, path: &Path) -> StorageResult<Option<Vec<u8>>>;

    /// Replace the document at `path` with `bytes`.
    ///
    /// On success the new content is durable. On failure the previous
    /// document (if any) is left intact.
    fn write_all(&mut self, path: &Path, bytes: &[u8]) -> StorageResult<()>;
}

/// Storage backed by a directory on a mounted filesystem.
///
/// Relative paths are resolved under the mount root. Writes go to a
/// temporary sibling file which is synced and then renamed over the target.
/// The containing directory is synced after the rename, so once
/// `write_all` returns the new document survives a power loss.
///
/// # Example
///
/// ```no_run
/// use keytag_storage::{FileStorage, Storage};
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut storage = FileStorage::new("/spiffs");
/// storage.write_all(Path::new("users.json"), b"[]")?;
///
/// assert_eq!(storage.read_all(Path::new("users.json"))?, Some(b"[]".to_vec()));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Create a storage rooted at `root`. The directory is created on the
    /// first write if it does not exist.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Mount root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `path` against the mount root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    fn temp_path(target: &Path) -> PathBuf {
        let mut name = target
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        target.with_file_name(name)
    }

    fn replace(target: &Path, bytes: &[u8]) -> io::Result<()> {
        let parent = target.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(parent) = parent {
            fs::create_dir_all(parent)?;
        }

        let temp_path = Self::temp_path(target);

        Self::write_synced(&temp_path, bytes)
            .and_then(|()| fs::rename(&temp_path, target))
            .inspect_err(|_| {
                let _ = fs::remove_file(&temp_path);
            })?;

        // The rename is only durable once the directory entry is flushed
        Self::sync_dir(parent.unwrap_or(Path::new(".")))
    }

    fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
        let mut file = fs::File::create(path)?;
        file.write_all(bytes)?;
        file.sync_all()
    }

    #[cfg(unix)]
    fn sync_dir(dir: &Path) -> io::Result<()> {
        fs::File::open(dir)?.sync_all()
    }

    // Directory handles cannot be synced here; the rename is flushed by the filesystem
    #[cfg(not(unix))]
    fn sync_dir(_dir: &Path) -> io::Result<()> {
        Ok(())
    }
}

impl Storage for FileStorage {
    fn read_all(&self, path: &Path) -> StorageResult<Option<Vec<u8>>> {
        let full_path = self.resolve(path);

        match fs::read(&full_path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read {
                path: full_path,
                source,
            }),
        }
    }

    fn write_all(&mut self, path: &Path, bytes: &[u8]) -> StorageResult<()> {
        let full_path = self.resolve(path);

        Self::replace(&full_path, bytes).map_err(|source| StorageError::Persistence {
            path: full_path,
            source,
        })
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    documents: HashMap<PathBuf, Vec<u8>>,
    fail_writes: bool,
}

/// In-memory storage.
///
/// Clones share the same documents, so a test can keep a clone to inspect
/// what was persisted or to switch write failures on after handing the
/// storage to a registry.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStorage {
    /// Create an empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a storage already holding one document
    pub fn with_document(path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) -> Self {
        let storage = Self::new();
        storage.lock().documents.insert(path.into(), bytes.into());
        storage
    }

    /// Make subsequent writes fail (or succeed again)
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Current document at `path`, decoded as UTF-8 (lossy)
    pub fn document(&self, path: impl AsRef<Path>) -> Option<String> {
        self.lock()
            .documents
            .get(path.as_ref())
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Paths of every stored document
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self.lock().documents.keys().cloned().collect();
        paths.sort();
        paths
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Storage for MemoryStorage {
    fn read_all(&self, path: &Path) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.lock().documents.get(path).cloned())
    }

    fn write_all(&mut self, path: &Path, bytes: &[u8]) -> StorageResult<()> {
        let mut inner = self.lock();

        if inner.fail_writes {
            return Err(StorageError::Persistence {
                path: path.to_path_buf(),
                source: io::Error::other("simulated write failure"),
            });
        }

        inner.documents.insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }
}
