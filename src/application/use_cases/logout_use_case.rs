//! Logout use case implementation.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::dto::LogoutResponse;
use crate::application::services::{ErrorClassifier, TokenLifecycleManager};
use crate::domain::ports::AuthPort;

/// Blacklists the refresh token server-side, then drops the local session.
#[derive(Clone)]
pub struct LogoutUseCase {
    auth_port: Arc<dyn AuthPort>,
    tokens: TokenLifecycleManager,
    classifier: ErrorClassifier,
}

impl LogoutUseCase {
    /// Creates new logout use case.
    #[must_use]
    pub const fn new(
        auth_port: Arc<dyn AuthPort>,
        tokens: TokenLifecycleManager,
        classifier: ErrorClassifier,
    ) -> Self {
        Self {
            auth_port,
            tokens,
            classifier,
        }
    }

    /// Executes logout. The local session is always cleared, even when the
    /// backend cannot be reached.
    pub async fn execute(&self) -> LogoutResponse {
        let state = self.tokens.snapshot();

        let revoked = match (&state.access_token, &state.refresh_token) {
            (Some(access), Some(refresh)) => {
                debug!("Revoking refresh token");
                match self.auth_port.revoke(access, refresh).await {
                    Ok(()) => true,
                    Err(failure) => {
                        let error = self.classifier.classify(failure);
                        warn!(class = %error.status_class(), "Token revocation failed");
                        false
                    }
                }
            }
            _ => {
                debug!("No complete token pair, skipping revocation");
                false
            }
        };

        self.tokens.logout();
        info!(revoked, "Logged out");

        LogoutResponse { revoked }
    }
}
