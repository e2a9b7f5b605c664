//! Runs one CLI command against the session services and prints the outcome.

use std::io::{self, Write};
use std::sync::Arc;

use tracing::info;

use crate::application::dto::LoginRequest;
use crate::application::services::{
    AuthenticatedClient, ClientPolicy, ErrorClassifier, GlobalErrorChannel, TokenLifecycleManager,
};
use crate::application::use_cases::{LoginUseCase, LogoutUseCase};
use crate::domain::errors::ClassifiedError;
use crate::domain::ports::{
    ApiRequest, AuthPort, ErrorReporterPort, HttpTransport, LocalePort, SecureStoragePort,
};
use crate::infrastructure::config::Command;

/// Wired session services.
pub struct App {
    tokens: TokenLifecycleManager,
    errors: GlobalErrorChannel,
    login_use_case: LoginUseCase,
    logout_use_case: LogoutUseCase,
    client: AuthenticatedClient,
}

impl App {
    #[must_use]
    pub fn new(
        auth_port: Arc<dyn AuthPort>,
        transport: Arc<dyn HttpTransport>,
        storage: Arc<dyn SecureStoragePort>,
        reporter: Arc<dyn ErrorReporterPort>,
        locale: Arc<dyn LocalePort>,
        policy: ClientPolicy,
    ) -> Self {
        let tokens = TokenLifecycleManager::create(auth_port.clone(), storage);
        let classifier = ErrorClassifier::new(reporter);
        let errors = GlobalErrorChannel::create();

        let login_use_case = LoginUseCase::new(
            auth_port.clone(),
            tokens.clone(),
            classifier.clone(),
            errors.clone(),
        );
        let logout_use_case = LogoutUseCase::new(auth_port, tokens.clone(), classifier.clone());
        let client = AuthenticatedClient::new(
            transport,
            tokens.clone(),
            classifier,
            errors.clone(),
            locale,
        )
        .with_policy(policy);

        Self {
            tokens,
            errors,
            login_use_case,
            logout_use_case,
            client,
        }
    }

    /// Runs `command`, writing human-readable output to `out`.
    ///
    /// Returns `false` when the command failed.
    ///
    /// # Errors
    /// Returns error only if writing to `out` fails.
    pub async fn run<W: Write>(&self, command: Command, out: &mut W) -> io::Result<bool> {
        let outcome = match command {
            Command::Login { username, password } => {
                match self
                    .login_use_case
                    .execute(LoginRequest::new(username, password))
                    .await
                {
                    Ok(response) => {
                        match response.user {
                            Some(user) => writeln!(out, "Logged in as {user}")?,
                            None => writeln!(out, "Logged in")?,
                        }
                        Ok(())
                    }
                    Err(e) => Err(e),
                }
            }
            Command::Logout => {
                let response = self.logout_use_case.execute().await;
                if response.revoked {
                    writeln!(out, "Logged out")?;
                } else {
                    writeln!(out, "Logged out locally; the server was not notified")?;
                }
                Ok(())
            }
            Command::Status => {
                self.write_status(out)?;
                Ok(())
            }
            Command::Get { path, params } => {
                let request = params
                    .into_iter()
                    .fold(ApiRequest::get(path), |request, (k, v)| request.with_query(k, v));
                match self.client.send(request).await {
                    Ok(response) => {
                        let body = response.body.unwrap_or(serde_json::Value::Null);
                        let rendered = serde_json::to_string_pretty(&body).map_err(io::Error::other)?;
                        writeln!(out, "{rendered}")?;
                        Ok(())
                    }
                    Err(e) => Err(e),
                }
            }
        };

        match outcome {
            Ok(()) => Ok(true),
            Err(error) => {
                self.write_error(out, &error)?;
                Ok(false)
            }
        }
    }

    fn write_status<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let state = self.tokens.snapshot();
        if !state.is_authenticated {
            return writeln!(out, "Not logged in");
        }

        match &state.user {
            Some(user) => writeln!(out, "Logged in as {user}")?,
            None => writeln!(out, "Logged in")?,
        }
        if let Some(access) = &state.access_token {
            writeln!(out, "  access token:  {access}")?;
        }
        match &state.refresh_token {
            Some(refresh) => writeln!(out, "  refresh token: {refresh}"),
            None => writeln!(out, "  refresh token: none"),
        }
    }

    /// Field-scoped errors are listed per field. Everything else shows the
    /// banner currently held by the global error slot.
    fn write_error<W: Write>(&self, out: &mut W, error: &ClassifiedError) -> io::Result<()> {
        if error.is_validation() {
            writeln!(out, "error: {}", error.message())?;
            for message in error.non_field_errors() {
                writeln!(out, "  - {message}")?;
            }
            for (field, message) in error.field_errors() {
                writeln!(out, "  {field}: {message}")?;
            }
            return Ok(());
        }

        let banner = self.errors.current().unwrap_or_else(|| error.clone());
        info!(key = banner.translation_key(), "Showing global error");
        writeln!(out, "error [{}]: {}", banner.translation_key(), banner.message())?;
        if let Some(detail) = banner.server_detail() {
            writeln!(out, "  server said: {detail}")?;
        }
        Ok(())
    }
}
