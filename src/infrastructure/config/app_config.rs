//! Application configuration.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::application::services::ClientPolicy;

pub(crate) const APP_NAME: &str = "session-guard";
pub(crate) const APP_QUALIFIER: &str = "dev";
pub(crate) const APP_ORGANIZATION: &str = "session-guard";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Converts to tracing level.
    #[must_use]
    pub const fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Where the session record is persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// System keyring.
    #[default]
    Keyring,
    /// JSON file in the data directory.
    File,
    /// Nothing survives the process.
    Memory,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Keyring => write!(f, "keyring"),
            Self::File => write!(f, "file"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Backend endpoints and request settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every path is joined onto.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Credential exchange endpoint.
    #[serde(default = "default_token_path")]
    pub token_path: String,

    /// Access token refresh endpoint.
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,

    /// Refresh token blacklist endpoint.
    #[serde(default = "default_logout_path")]
    pub logout_path: String,

    /// Scheme prefix of the `Authorization` header.
    #[serde(default = "default_auth_scheme")]
    pub auth_scheme: String,

    /// Value sent in `Accept-Language`.
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl ApiConfig {
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token_path: default_token_path(),
            refresh_path: default_refresh_path(),
            logout_path: default_logout_path(),
            auth_scheme: default_auth_scheme(),
            locale: default_locale(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Session behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Storage backend for the session record.
    #[serde(default)]
    pub storage: StorageBackend,

    /// Drop the local session when a refresh attempt fails.
    #[serde(default = "default_true")]
    pub clear_on_refresh_failure: bool,

    /// Empty the global error slot after any successful request.
    #[serde(default = "default_true")]
    pub clear_global_error_on_success: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage: StorageBackend::default(),
            clear_on_refresh_failure: true,
            clear_global_error_on_success: true,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_token_path() -> String {
    "/token/".to_string()
}

fn default_refresh_path() -> String {
    "/token/refresh/".to_string()
}

fn default_logout_path() -> String {
    "/logout/".to_string()
}

fn default_auth_scheme() -> String {
    "Bearer".to_string()
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

/// Application configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[serde(default)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Backend settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Session settings.
    #[serde(default)]
    pub session: SessionConfig,
}

use super::args::CliArgs;

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(config_path) = &args.config {
            self.config = Some(config_path.clone());
        }
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(base_url) = &args.base_url {
            self.api.base_url.clone_from(base_url);
        }
        if let Some(locale) = &args.locale {
            self.api.locale.clone_from(locale);
        }
        if let Some(storage) = args.storage {
            self.session.storage = storage;
        }
    }

    /// Client behaviour derived from the session settings.
    #[must_use]
    pub fn client_policy(&self) -> ClientPolicy {
        ClientPolicy {
            auth_scheme: self.api.auth_scheme.clone(),
            clear_session_on_refresh_failure: self.session.clear_on_refresh_failure,
            clear_global_error_on_success: self.session.clear_global_error_on_success,
        }
    }

    /// Returns default config directory.
    #[must_use]
    pub fn default_config_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns default log file path.
    #[must_use]
    pub fn default_log_path() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.data_dir().join("session-guard.log"))
    }

    /// Returns default path of the file session store.
    #[must_use]
    pub fn default_session_path() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.data_dir().join("session.json"))
    }

    /// Returns effective log path.
    #[must_use]
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        self.log_path.clone().or_else(Self::default_log_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_partial_config() {
        let toml_content = r#"
            log_level = "debug"

            [api]
            base_url = "https://tasks.example.com/api"
            locale = "de"

            [session]
            storage = "file"
            clear_on_refresh_failure = false
        "#;

        let config: AppConfig = toml::from_str(toml_content).expect("Failed to parse config");

        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.api.base_url, "https://tasks.example.com/api");
        assert_eq!(config.api.locale, "de");
        assert_eq!(config.api.token_path, "/token/");
        assert_eq!(config.session.storage, StorageBackend::File);
        assert!(!config.session.clear_on_refresh_failure);
        assert!(config.session.clear_global_error_on_success);
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.api.auth_scheme, "Bearer");
        assert_eq!(config.api.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.session.storage, StorageBackend::Keyring);
    }

    #[test]
    fn test_cli_overrides_file_values() {
        let mut config = AppConfig::default();
        let args = CliArgs::parse_from([
            "session-guard",
            "--base-url",
            "http://127.0.0.1:9000",
            "--storage",
            "memory",
            "status",
        ]);

        config.merge_with_args(&args);

        assert_eq!(config.api.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.session.storage, StorageBackend::Memory);
        assert_eq!(config.api.locale, "en");
    }

    #[test]
    fn test_client_policy_follows_session_settings() {
        let mut config = AppConfig::default();
        config.session.clear_global_error_on_success = false;
        config.api.auth_scheme = "JWT".to_string();

        let policy = config.client_policy();

        assert_eq!(policy.auth_scheme, "JWT");
        assert!(policy.clear_session_on_refresh_failure);
        assert!(!policy.clear_global_error_on_success);
    }
}
