//! Token endpoint client.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::dto::{RefreshRequest, RefreshResponse, TokenRequest, TokenResponse};
use crate::domain::entities::{AuthToken, Credentials, TokenPair};
use crate::domain::errors::RawFailure;
use crate::domain::ports::{
    ApiRequest, ApiResponse, AuthPort, HttpTransport, LocalePort, RefreshGrant, RequestHeaders,
    TokenGrant,
};

/// Paths of the token endpoints, relative to the transport's base URL.
#[derive(Debug, Clone)]
pub struct AuthEndpoints {
    pub token_path: String,
    pub refresh_path: String,
    pub logout_path: String,
}

/// [`AuthPort`] over any [`HttpTransport`].
pub struct HttpAuthClient {
    transport: Arc<dyn HttpTransport>,
    endpoints: AuthEndpoints,
    auth_scheme: String,
    locale: Arc<dyn LocalePort>,
}

impl HttpAuthClient {
    #[must_use]
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        endpoints: AuthEndpoints,
        auth_scheme: impl Into<String>,
        locale: Arc<dyn LocalePort>,
    ) -> Self {
        Self {
            transport,
            endpoints,
            auth_scheme: auth_scheme.into(),
            locale,
        }
    }

    async fn post<B, R>(
        &self,
        path: &str,
        body: &B,
        authorization: Option<String>,
    ) -> Result<(u16, R), RawFailure>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let body = serde_json::to_value(body).map_err(|e| RawFailure::application(e.to_string()))?;
        let request = ApiRequest::post(path, body);
        let headers = RequestHeaders {
            authorization,
            accept_language: Some(self.locale.current_locale()),
        };

        let response = self.transport.execute(&request, &headers).await?;
        if !response.is_success() {
            debug!(path, status = response.status, "Token endpoint rejected request");
            return Err(response.into_failure());
        }

        decode(&response).map(|decoded| (response.status, decoded))
    }
}

fn decode<R: DeserializeOwned>(response: &ApiResponse) -> Result<R, RawFailure> {
    response.json().map_err(|e| {
        warn!(error = %e, "Unexpected token endpoint body");
        RawFailure::decode(response.status, e.to_string())
    })
}

fn require_access(status: u16, access: Option<String>) -> Result<AuthToken, RawFailure> {
    access
        .and_then(AuthToken::new)
        .ok_or_else(|| RawFailure::decode(status, "response did not contain an access token"))
}

#[async_trait]
impl AuthPort for HttpAuthClient {
    async fn obtain_tokens(&self, credentials: &Credentials) -> Result<TokenGrant, RawFailure> {
        let body = TokenRequest {
            username: credentials.username(),
            password: credentials.password(),
        };

        let (status, response): (_, TokenResponse) =
            self.post(&self.endpoints.token_path, &body, None).await?;
        let access = require_access(status, response.access)?;

        Ok(TokenGrant {
            pair: TokenPair {
                access_token: Some(access),
                refresh_token: response.refresh.and_then(AuthToken::new),
            },
            user: response.user,
        })
    }

    async fn refresh(&self, refresh_token: &AuthToken) -> Result<RefreshGrant, RawFailure> {
        let body = RefreshRequest {
            refresh: refresh_token.as_str(),
        };

        let (status, response): (_, RefreshResponse) =
            self.post(&self.endpoints.refresh_path, &body, None).await?;

        Ok(RefreshGrant {
            access_token: require_access(status, response.access)?,
            refresh_token: response.refresh.and_then(AuthToken::new),
        })
    }

    async fn revoke(
        &self,
        access_token: &AuthToken,
        refresh_token: &AuthToken,
    ) -> Result<(), RawFailure> {
        let body = RefreshRequest {
            refresh: refresh_token.as_str(),
        };
        let authorization = format!("{} {}", self.auth_scheme, access_token.as_str());

        let request = ApiRequest::post(
            &self.endpoints.logout_path,
            serde_json::to_value(&body).map_err(|e| RawFailure::application(e.to_string()))?,
        );
        let headers = RequestHeaders {
            authorization: Some(authorization),
            accept_language: Some(self.locale.current_locale()),
        };

        let response = self.transport.execute(&request, &headers).await?;
        if response.is_success() {
            Ok(())
        } else {
            Err(response.into_failure())
        }
    }
}
