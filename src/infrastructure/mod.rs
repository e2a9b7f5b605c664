//! Infrastructure layer with external service adapters.

/// Backend HTTP adapters.
pub mod api;
/// Application configuration.
pub mod config;
/// Runtime locale.
pub mod locale;
/// Error reporting.
pub mod reporting;
/// Secure storage adapters.
pub mod storage;

pub use api::{AuthEndpoints, HttpAuthClient, ReqwestTransport, TransportError};
pub use config::{AppConfig, CliArgs, Command, ConfigError, LogLevel, StorageBackend, StorageManager};
pub use locale::SharedLocale;
pub use reporting::TracingErrorReporter;
pub use storage::{FileSecureStorage, KeyringSecureStorage, MemorySecureStorage};
