//! Keyring-backed secure storage.

use keyring::Entry;
use tracing::{debug, warn};

use crate::domain::errors::SecretError;
use crate::domain::ports::SecureStoragePort;

const KEYRING_SERVICE: &str = "session-guard";

/// System keyring adapter. Each key becomes one keyring entry under the
/// configured service name.
pub struct KeyringSecureStorage {
    service: String,
}

impl KeyringSecureStorage {
    /// Creates new storage with the default service name.
    #[must_use]
    pub fn new() -> Self {
        Self::with_service(KEYRING_SERVICE)
    }

    /// Creates storage with a custom service name.
    #[must_use]
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry, SecretError> {
        Entry::new(&self.service, key)
            .map_err(|e| SecretError::AccessFailed(format!("failed to access keyring: {e}")))
    }
}

impl Default for KeyringSecureStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl SecureStoragePort for KeyringSecureStorage {
    fn get(&self, key: &str) -> Result<Option<String>, SecretError> {
        debug!(service = %self.service, key, "Reading keyring entry");

        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => {
                debug!(key, "No keyring entry");
                Ok(None)
            }
            Err(e) => {
                warn!(error = %e, key, "Failed to read keyring entry");
                Err(SecretError::RetrievalFailed(e.to_string()))
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SecretError> {
        debug!(service = %self.service, key, "Writing keyring entry");

        self.entry(key)?.set_password(value).map_err(|e| {
            warn!(error = %e, key, "Failed to write keyring entry");
            SecretError::StorageFailed(e.to_string())
        })
    }

    fn remove(&self, key: &str) -> Result<(), SecretError> {
        debug!(service = %self.service, key, "Deleting keyring entry");

        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => {
                warn!(error = %e, key, "Failed to delete keyring entry");
                Err(SecretError::DeletionFailed(e.to_string()))
            }
        }
    }
}
