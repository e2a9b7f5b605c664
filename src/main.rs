use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use session_guard::domain::ports::SecureStoragePort;
use session_guard::infrastructure::{
    AppConfig, AuthEndpoints, CliArgs, FileSecureStorage, HttpAuthClient, KeyringSecureStorage,
    MemorySecureStorage, ReqwestTransport, SharedLocale, StorageBackend, StorageManager,
    TracingErrorReporter,
};
use session_guard::presentation::App;

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = config.effective_log_path() {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

fn load_config(args: &CliArgs) -> Result<AppConfig> {
    let manager = StorageManager::new()?;
    let mut config = manager.load_config(args.config.as_deref())?;
    config.merge_with_args(args);
    Ok(config)
}

fn secure_storage(config: &AppConfig) -> Result<Arc<dyn SecureStoragePort>> {
    let storage: Arc<dyn SecureStoragePort> = match config.session.storage {
        StorageBackend::Keyring => Arc::new(KeyringSecureStorage::new()),
        StorageBackend::File => {
            let path = AppConfig::default_session_path()
                .ok_or_else(|| eyre!("failed to determine data directory"))?;
            Arc::new(FileSecureStorage::new(path))
        }
        StorageBackend::Memory => Arc::new(MemorySecureStorage::new()),
    };
    Ok(storage)
}

fn create_app(config: &AppConfig) -> Result<App> {
    let locale = Arc::new(SharedLocale::new(config.api.locale.clone()));
    let transport = Arc::new(
        ReqwestTransport::new(&config.api.base_url, config.api.request_timeout())
            .wrap_err("failed to create HTTP transport")?,
    );
    let auth_client = Arc::new(HttpAuthClient::new(
        transport.clone(),
        AuthEndpoints {
            token_path: config.api.token_path.clone(),
            refresh_path: config.api.refresh_path.clone(),
            logout_path: config.api.logout_path.clone(),
        },
        config.api.auth_scheme.clone(),
        locale.clone(),
    ));

    Ok(App::new(
        auth_client,
        transport,
        secure_storage(config)?,
        Arc::new(TracingErrorReporter::new()),
        locale,
        config.client_policy(),
    ))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    let args = CliArgs::parse();
    let config = load_config(&args)?;

    init_logging(&config)?;

    info!(
        version = session_guard::VERSION,
        base_url = %config.api.base_url,
        storage = %config.session.storage,
        "Starting session-guard"
    );

    let app = create_app(&config)?;
    let succeeded = app.run(args.command, &mut std::io::stdout().lock()).await?;

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
