//! Secure key-value storage port definition.

use crate::domain::errors::SecretError;

/// Port for the persistent store that survives restarts.
///
/// Calls are synchronous so session mutations are persisted before they return.
pub trait SecureStoragePort: Send + Sync {
    /// Reads a value.
    ///
    /// # Errors
    /// Returns error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, SecretError>;

    /// Writes a value, replacing any previous one.
    ///
    /// # Errors
    /// Returns error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), SecretError>;

    /// Removes a value. Removing a missing key succeeds.
    ///
    /// # Errors
    /// Returns error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), SecretError>;
}
