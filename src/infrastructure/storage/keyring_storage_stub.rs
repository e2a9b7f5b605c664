//! Stub keyring storage for builds without keyring support.

use tracing::debug;

use crate::domain::errors::SecretError;
use crate::domain::ports::SecureStoragePort;

/// Stub storage that keeps nothing.
/// Used when the keyring feature is disabled.
pub struct KeyringSecureStorage;

impl KeyringSecureStorage {
    /// Creates new stub storage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Creates storage with a custom service name (no-op in stub).
    #[must_use]
    pub fn with_service(_service: impl Into<String>) -> Self {
        Self
    }
}

impl Default for KeyringSecureStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl SecureStoragePort for KeyringSecureStorage {
    fn get(&self, _key: &str) -> Result<Option<String>, SecretError> {
        debug!("Keyring feature disabled - nothing persisted");
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), SecretError> {
        debug!("Keyring feature disabled - cannot persist session");
        Ok(())
    }

    fn remove(&self, _key: &str) -> Result<(), SecretError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_keeps_nothing() {
        let storage = KeyringSecureStorage::new();
        storage.set("authState", "{}").unwrap();
        assert!(storage.get("authState").unwrap().is_none());
    }
}
