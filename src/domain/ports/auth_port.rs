//! Authentication endpoint port definition.

use async_trait::async_trait;

use crate::domain::entities::{AuthToken, Credentials, SessionUser, TokenPair};
use crate::domain::errors::RawFailure;

/// Tokens issued by a successful login.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub pair: TokenPair,
    pub user: Option<SessionUser>,
}

/// Tokens issued by a successful refresh.
///
/// A missing `refresh_token` means the current one stays valid.
#[derive(Debug, Clone)]
pub struct RefreshGrant {
    pub access_token: AuthToken,
    pub refresh_token: Option<AuthToken>,
}

/// Port for the backend's token endpoints.
#[async_trait]
pub trait AuthPort: Send + Sync {
    /// Exchanges credentials for a token pair.
    async fn obtain_tokens(&self, credentials: &Credentials) -> Result<TokenGrant, RawFailure>;

    /// Mints a new access token. A response without `access` is a failure.
    async fn refresh(&self, refresh_token: &AuthToken) -> Result<RefreshGrant, RawFailure>;

    /// Blacklists the refresh token server-side.
    async fn revoke(
        &self,
        access_token: &AuthToken,
        refresh_token: &AuthToken,
    ) -> Result<(), RawFailure>;
}
