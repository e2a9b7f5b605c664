//! Login use case implementation.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::dto::{LoginRequest, LoginResponse};
use crate::application::services::{ErrorClassifier, GlobalErrorChannel, TokenLifecycleManager};
use crate::domain::errors::ClassifiedError;
use crate::domain::ports::AuthPort;

const REQUIRED_FIELD: &str = "This field is required.";

/// Handles the credential login workflow.
#[derive(Clone)]
pub struct LoginUseCase {
    auth_port: Arc<dyn AuthPort>,
    tokens: TokenLifecycleManager,
    classifier: ErrorClassifier,
    errors: GlobalErrorChannel,
}

impl LoginUseCase {
    /// Creates new login use case.
    #[must_use]
    pub const fn new(
        auth_port: Arc<dyn AuthPort>,
        tokens: TokenLifecycleManager,
        classifier: ErrorClassifier,
        errors: GlobalErrorChannel,
    ) -> Self {
        Self {
            auth_port,
            tokens,
            classifier,
            errors,
        }
    }

    /// Executes login with provided request.
    ///
    /// # Errors
    /// Returns a validation error for missing fields, or the classified failure
    /// from the token endpoint.
    pub async fn execute(&self, request: LoginRequest) -> Result<LoginResponse, ClassifiedError> {
        let credentials = request.credentials;
        debug!(username = %credentials.username(), "Attempting login");

        if !credentials.is_complete() {
            warn!("Login attempted with incomplete credentials");
            let mut fields = BTreeMap::new();
            if credentials.username().trim().is_empty() {
                fields.insert("username".to_string(), REQUIRED_FIELD.to_string());
            }
            if credentials.password().is_empty() {
                fields.insert("password".to_string(), REQUIRED_FIELD.to_string());
            }
            return Err(self.classifier.local_validation(fields));
        }

        let grant = match self.auth_port.obtain_tokens(&credentials).await {
            Ok(grant) => grant,
            Err(failure) => {
                let error = self.classifier.classify(failure);
                warn!(class = %error.status_class(), "Login failed");
                if error.status_class().is_globally_displayable() {
                    self.errors.publish(error.clone());
                }
                return Err(error);
            }
        };

        info!(
            user = ?grant.user.as_ref().map(|u| u.username().to_string()),
            "Successfully authenticated"
        );

        self.tokens.login_with_user(grant.pair, grant.user.clone());
        self.errors.clear();

        Ok(LoginResponse::new(grant.user))
    }
}
