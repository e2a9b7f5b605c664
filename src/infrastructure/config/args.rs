use super::app_config::{LogLevel, StorageBackend};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "session-guard",
    version,
    about = "Authenticated API client with token refresh and error classification",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Backend base URL.
    #[arg(long, env = "SESSION_GUARD_BASE_URL", value_name = "URL")]
    pub base_url: Option<String>,

    /// Locale sent as `Accept-Language`.
    #[arg(long, value_name = "TAG")]
    pub locale: Option<String>,

    /// Session storage backend.
    #[arg(long, value_enum)]
    pub storage: Option<StorageBackend>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Exchange credentials for a token pair.
    Login {
        #[arg(short, long, env = "SESSION_GUARD_USERNAME")]
        username: String,

        #[arg(short, long, env = "SESSION_GUARD_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Revoke the refresh token and drop the local session.
    Logout,

    /// Show the persisted session.
    Status,

    /// Fetch a resource with the session's credentials.
    Get {
        /// Path relative to the base URL.
        path: String,

        /// Query parameter as `key=value`.
        #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))
}
