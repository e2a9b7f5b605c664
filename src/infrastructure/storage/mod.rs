//! Secure storage adapters.

mod file_storage;
#[cfg(feature = "keyring")]
mod keyring_storage;
#[cfg(not(feature = "keyring"))]
mod keyring_storage_stub;
mod memory_storage;

pub use file_storage::FileSecureStorage;
#[cfg(feature = "keyring")]
pub use keyring_storage::KeyringSecureStorage;
#[cfg(not(feature = "keyring"))]
pub use keyring_storage_stub::KeyringSecureStorage;
pub use memory_storage::MemorySecureStorage;
