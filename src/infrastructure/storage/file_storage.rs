//! File-backed secure storage.
//!
//! Values live in a single JSON object. Writes go to a temporary file in the
//! same directory which is then renamed over the original, so a crash never
//! leaves a truncated store behind.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::domain::errors::SecretError;
use crate::domain::ports::SecureStoragePort;

type Store = BTreeMap<String, String>;

/// JSON file storage for hosts without a keyring.
#[derive(Debug)]
pub struct FileSecureStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSecureStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_store(&self) -> Result<Store, SecretError> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(Store::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Store::new()),
            Err(e) => Err(SecretError::RetrievalFailed(format!(
                "{}: {e}",
                self.path.display()
            ))),
        }
    }

    fn write_store(&self, store: &Store) -> Result<(), SecretError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(|e| SecretError::StorageFailed(e.to_string()))?;

        let content = serde_json::to_vec_pretty(store)?;
        let mut file =
            NamedTempFile::new_in(dir).map_err(|e| SecretError::StorageFailed(e.to_string()))?;
        file.write_all(&content)
            .map_err(|e| SecretError::StorageFailed(e.to_string()))?;
        restrict_permissions(file.path());
        file.persist(&self.path).map_err(|e| {
            warn!(error = %e, path = %self.path.display(), "Failed to replace store file");
            SecretError::StorageFailed(e.to_string())
        })?;

        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        warn!(error = %e, "Failed to restrict store file permissions");
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}

impl SecureStoragePort for FileSecureStorage {
    fn get(&self, key: &str) -> Result<Option<String>, SecretError> {
        let _guard = self.lock.lock();
        Ok(self.read_store()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SecretError> {
        let _guard = self.lock.lock();
        let mut store = self.read_store()?;
        store.insert(key.to_string(), value.to_string());
        debug!(key, path = %self.path.display(), "Writing store file");
        self.write_store(&store)
    }

    fn remove(&self, key: &str) -> Result<(), SecretError> {
        let _guard = self.lock.lock();
        let mut store = self.read_store()?;
        if store.remove(key).is_none() {
            return Ok(());
        }
        self.write_store(&store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let storage = FileSecureStorage::new(dir.path().join("session.json"));

        assert!(storage.get("authState").unwrap().is_none());
    }

    #[test]
    fn test_values_survive_new_instance() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("session.json");

        FileSecureStorage::new(&path).set("authState", "{}").unwrap();
        FileSecureStorage::new(&path).set("other", "1").unwrap();

        let reopened = FileSecureStorage::new(&path);
        assert_eq!(reopened.get("authState").unwrap().as_deref(), Some("{}"));
        assert_eq!(reopened.get("other").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_remove_keeps_other_keys() {
        let dir = TempDir::new().unwrap();
        let storage = FileSecureStorage::new(dir.path().join("session.json"));
        storage.set("a", "1").unwrap();
        storage.set("b", "2").unwrap();

        storage.remove("a").unwrap();
        storage.remove("missing").unwrap();

        assert!(storage.get("a").unwrap().is_none());
        assert_eq!(storage.get("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_corrupt_file_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();

        let result = FileSecureStorage::new(&path).get("authState");

        assert!(matches!(result, Err(SecretError::Malformed(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        FileSecureStorage::new(&path).set("k", "v").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
