//! Process-local secure storage.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::domain::errors::SecretError;
use crate::domain::ports::SecureStoragePort;

/// Storage that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemorySecureStorage {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySecureStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecureStoragePort for MemorySecureStorage {
    fn get(&self, key: &str) -> Result<Option<String>, SecretError> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SecretError> {
        self.values
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SecretError> {
        self.values.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let storage = MemorySecureStorage::new();

        storage.set("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));

        storage.remove("k").unwrap();
        storage.remove("k").unwrap();
        assert!(storage.get("k").unwrap().is_none());
    }
}
