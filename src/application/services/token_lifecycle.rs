//! Access/refresh token ownership with single-flight refresh.

use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::domain::entities::{AUTH_STATE_KEY, AuthState, SessionUser, TokenPair};
use crate::domain::errors::SecretError;
use crate::domain::ports::{AuthPort, SecureStoragePort};

type PendingRefresh = Shared<BoxFuture<'static, bool>>;

/// Session record plus a counter bumped by every login and logout.
///
/// A refresh only applies its grant when the generation it started from is
/// still current.
#[derive(Default)]
struct Session {
    record: AuthState,
    generation: u64,
}

/// Owns the session's token pair.
///
/// The pair is replaced with a single write, so readers never observe a
/// half-updated session. Storage is written while that write lock is held, so
/// the persisted record always matches the last applied change. At most one
/// refresh is in flight; it runs on its own task and concurrent callers await
/// the same outcome.
#[derive(Clone)]
pub struct TokenLifecycleManager {
    auth_port: Arc<dyn AuthPort>,
    storage: Arc<dyn SecureStoragePort>,
    state: Arc<RwLock<Session>>,
    pending: Arc<Mutex<Option<PendingRefresh>>>,
}

impl TokenLifecycleManager {
    /// Creates the manager and restores any persisted session.
    #[must_use]
    pub fn create(auth_port: Arc<dyn AuthPort>, storage: Arc<dyn SecureStoragePort>) -> Self {
        let record = Self::restore(storage.as_ref());

        Self {
            auth_port,
            storage,
            state: Arc::new(RwLock::new(Session {
                record,
                generation: 0,
            })),
            pending: Arc::new(Mutex::new(None)),
        }
    }

    fn restore(storage: &dyn SecureStoragePort) -> AuthState {
        match storage.get(AUTH_STATE_KEY) {
            Ok(Some(raw)) => match AuthState::from_json(&raw) {
                Ok(state) => {
                    info!(
                        authenticated = state.is_authenticated,
                        "Restored session from secure storage"
                    );
                    state
                }
                Err(e) => {
                    warn!(error = %e, "Discarding malformed session record");
                    AuthState::default()
                }
            },
            Ok(None) => {
                debug!("No persisted session found");
                AuthState::default()
            }
            Err(e) => {
                warn!(error = %e, "Failed to read persisted session");
                AuthState::default()
            }
        }
    }

    /// Current access token.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.state
            .read()
            .record
            .access_token
            .as_ref()
            .map(|token| token.as_str().to_string())
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.read().record.is_authenticated
    }

    #[must_use]
    pub fn user(&self) -> Option<SessionUser> {
        self.state.read().record.user.clone()
    }

    /// Copy of the full session record.
    #[must_use]
    pub fn snapshot(&self) -> AuthState {
        self.state.read().record.clone()
    }

    /// Installs a freshly issued pair.
    pub fn login(&self, pair: TokenPair) {
        self.login_with_user(pair, None);
    }

    /// Installs a freshly issued pair together with the user it belongs to.
    pub fn login_with_user(&self, pair: TokenPair, user: Option<SessionUser>) {
        let record = AuthState::from_pair(pair, user);
        info!(
            access = ?record.access_token,
            user = ?record.user.as_ref().map(SessionUser::username),
            "Session established"
        );

        let mut session = self.state.write();
        session.generation += 1;
        session.record = record;
        self.persist(&session.record);
    }

    /// Drops the session locally and removes the persisted record.
    pub fn logout(&self) {
        let mut session = self.state.write();
        session.generation += 1;
        session.record = AuthState::default();

        match self.storage.remove(AUTH_STATE_KEY) {
            Ok(()) => info!("Session cleared"),
            Err(e) => error!(error = %e, "Failed to remove persisted session"),
        }
    }

    /// Mints a new access token, sharing one attempt among concurrent callers.
    ///
    /// Returns `false` when no refresh token is held, the endpoint fails, or
    /// the session was replaced by a login or logout while the call was in
    /// flight; the pair is left untouched in those cases. Dropping the
    /// returned future does not cancel the attempt.
    pub async fn refresh(&self) -> bool {
        let pending = {
            let mut slot = self.pending.lock();
            if let Some(existing) = slot.as_ref() {
                debug!("Joining in-flight token refresh");
                existing.clone()
            } else {
                let task = tokio::spawn(self.clone().run_refresh());
                let attempt = async move {
                    task.await.unwrap_or_else(|e| {
                        error!(error = %e, "Token refresh task failed");
                        false
                    })
                }
                .boxed()
                .shared();
                *slot = Some(attempt.clone());
                attempt
            }
        };

        pending.await
    }

    /// Releases the pending refresh handle.
    pub fn dispose(&self) {
        self.pending.lock().take();
    }

    async fn run_refresh(self) -> bool {
        let refreshed = self.refresh_once().await;
        self.pending.lock().take();
        refreshed
    }

    async fn refresh_once(&self) -> bool {
        let (refresh_token, generation) = {
            let session = self.state.read();
            (session.record.refresh_token.clone(), session.generation)
        };
        let Some(refresh_token) = refresh_token else {
            debug!("No refresh token available, skipping refresh");
            return false;
        };

        debug!(refresh = %refresh_token, "Refreshing access token");

        let grant = match self.auth_port.refresh(&refresh_token).await {
            Ok(grant) => grant,
            Err(failure) => {
                warn!(error = %failure, "Token refresh failed");
                return false;
            }
        };

        let mut session = self.state.write();
        if session.generation != generation {
            info!("Session changed during refresh, discarding new token");
            return false;
        }

        session.record.access_token = Some(grant.access_token);
        if let Some(rotated) = grant.refresh_token {
            session.record.refresh_token = Some(rotated);
        }
        session.record.is_authenticated = true;

        info!(access = ?session.record.access_token, "Access token refreshed");
        self.persist(&session.record);
        true
    }

    fn persist(&self, state: &AuthState) {
        let result = state
            .to_json()
            .map_err(SecretError::from)
            .and_then(|raw| self.storage.set(AUTH_STATE_KEY, &raw));

        if let Err(e) = result {
            error!(error = %e, "Failed to persist session to secure storage");
        }
    }
}
