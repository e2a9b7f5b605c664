//! Resource client that authenticates requests and recovers from expired sessions.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use super::error_classifier::ErrorClassifier;
use super::fetch_deduper::FetchDeduper;
use super::global_error_channel::GlobalErrorChannel;
use super::token_lifecycle::TokenLifecycleManager;
use crate::domain::errors::{ClassifiedError, RawFailure};
use crate::domain::ports::{ApiRequest, ApiResponse, HttpTransport, LocalePort, RequestHeaders};

/// Behavior switches for [`AuthenticatedClient`].
#[derive(Debug, Clone)]
pub struct ClientPolicy {
    /// `Authorization` scheme placed before the token.
    pub auth_scheme: String,
    /// Drop the local session when a refresh attempt fails.
    pub clear_session_on_refresh_failure: bool,
    /// Empty the global error slot after a successful request.
    pub clear_global_error_on_success: bool,
}

impl Default for ClientPolicy {
    fn default() -> Self {
        Self {
            auth_scheme: "Bearer".to_string(),
            clear_session_on_refresh_failure: true,
            clear_global_error_on_success: true,
        }
    }
}

/// Sends resource requests with the session's credentials.
///
/// Concurrent identical reads share one network call. An expired session
/// triggers a single refresh and a single retry; failures that should interrupt
/// the user are published to the [`GlobalErrorChannel`] and returned as well.
#[derive(Clone)]
pub struct AuthenticatedClient {
    transport: Arc<dyn HttpTransport>,
    tokens: TokenLifecycleManager,
    classifier: ErrorClassifier,
    errors: GlobalErrorChannel,
    locale: Arc<dyn LocalePort>,
    deduper: FetchDeduper<ApiResponse>,
    policy: ClientPolicy,
}

impl AuthenticatedClient {
    #[must_use]
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        tokens: TokenLifecycleManager,
        classifier: ErrorClassifier,
        errors: GlobalErrorChannel,
        locale: Arc<dyn LocalePort>,
    ) -> Self {
        Self {
            transport,
            tokens,
            classifier,
            errors,
            locale,
            deduper: FetchDeduper::create(),
            policy: ClientPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: ClientPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Deduplicator used for reads; shared by clones of this client.
    #[must_use]
    pub const fn deduper(&self) -> &FetchDeduper<ApiResponse> {
        &self.deduper
    }

    /// Sends `request`, joining an identical in-flight read when one exists.
    ///
    /// # Errors
    /// Returns the classified failure. Displayable failures are also published
    /// globally; validation failures are only returned.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClassifiedError> {
        if !request.method.is_idempotent_read() {
            return self.dispatch(request).await;
        }

        let key = request.key();
        let client = self.clone();
        self.deduper
            .run(key, move || async move { client.dispatch(request).await })
            .await
    }

    /// Sends `request` and decodes the response body.
    ///
    /// # Errors
    /// Returns the classified failure; an undecodable body is classified as
    /// an unknown failure.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<T, ClassifiedError> {
        let response = self.send(request).await?;

        response.json().map_err(|e| {
            warn!(error = %e, "Response body did not match the expected shape");
            let failure = RawFailure::decode(response.status, e.to_string());
            self.surface(self.classifier.classify(failure))
        })
    }

    async fn dispatch(&self, request: ApiRequest) -> Result<ApiResponse, ClassifiedError> {
        let result = match self.attempt(&request).await {
            Err(error) if error.is_session_expired() && error.status().is_some() => {
                self.recover(&request, error).await
            }
            other => other,
        };

        match result {
            Ok(response) => {
                if self.policy.clear_global_error_on_success {
                    self.errors.clear();
                }
                Ok(response)
            }
            Err(error) => Err(self.surface(error)),
        }
    }

    async fn recover(
        &self,
        request: &ApiRequest,
        expired: ClassifiedError,
    ) -> Result<ApiResponse, ClassifiedError> {
        debug!(path = %request.path, "Session expired, attempting refresh");

        if !self.tokens.refresh().await {
            info!("Refresh failed, session cannot be recovered");
            if self.policy.clear_session_on_refresh_failure {
                self.tokens.logout();
            }
            return Err(expired);
        }

        debug!(path = %request.path, "Retrying request with refreshed token");
        self.attempt(request).await
    }

    async fn attempt(&self, request: &ApiRequest) -> Result<ApiResponse, ClassifiedError> {
        let Some(token) = self.tokens.access_token() else {
            debug!(path = %request.path, "No access token, not sending request");
            return Err(self.classifier.missing_token());
        };

        let headers = RequestHeaders {
            authorization: Some(format!("{} {}", self.policy.auth_scheme, token)),
            accept_language: Some(self.locale.current_locale()),
        };

        match self.transport.execute(request, &headers).await {
            Ok(response) if response.is_success() => Ok(response),
            Ok(response) => Err(self.classifier.classify(response.into_failure())),
            Err(failure) => Err(self.classifier.classify(failure)),
        }
    }

    fn surface(&self, error: ClassifiedError) -> ClassifiedError {
        if error.status_class().is_globally_displayable() {
            self.errors.publish(error.clone());
        }
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::TokenPair;
    use crate::domain::errors::StatusClass;
    use crate::domain::ports::mocks::{MockAuthPort, MockSecureStorage, MockTransport};
    use crate::domain::ports::{ErrorReporterPort, HttpMethod};
    use crate::infrastructure::SharedLocale;
    use serde_json::json;
    use std::time::Duration;

    struct SilentReporter;

    impl ErrorReporterPort for SilentReporter {
        fn report(&self, _error: &ClassifiedError) {}
    }

    struct Fixture {
        client: AuthenticatedClient,
        transport: Arc<MockTransport>,
        auth: Arc<MockAuthPort>,
        tokens: TokenLifecycleManager,
        errors: GlobalErrorChannel,
    }

    fn fixture(transport: MockTransport, auth: MockAuthPort, pair: Option<TokenPair>) -> Fixture {
        let transport = Arc::new(transport);
        let auth = Arc::new(auth);
        let tokens =
            TokenLifecycleManager::create(auth.clone(), Arc::new(MockSecureStorage::new()));
        if let Some(pair) = pair {
            tokens.login(pair);
        }
        let errors = GlobalErrorChannel::create();
        let client = AuthenticatedClient::new(
            transport.clone(),
            tokens.clone(),
            ErrorClassifier::new(Arc::new(SilentReporter)),
            errors.clone(),
            Arc::new(SharedLocale::new("fr-FR")),
        );

        Fixture {
            client,
            transport,
            auth,
            tokens,
            errors,
        }
    }

    #[tokio::test]
    async fn test_attaches_authorization_and_locale() {
        let f = fixture(
            MockTransport::always(ApiResponse::ok(json!([]))),
            MockAuthPort::new("unused"),
            Some(TokenPair::new("abc", "r")),
        );

        f.client.send(ApiRequest::get("/tasks")).await.unwrap();

        let headers = f.transport.seen_headers();
        assert_eq!(headers[0].authorization.as_deref(), Some("Bearer abc"));
        assert_eq!(headers[0].accept_language.as_deref(), Some("fr-FR"));
    }

    #[tokio::test]
    async fn test_custom_auth_scheme() {
        let f = fixture(
            MockTransport::always(ApiResponse::ok(json!({}))),
            MockAuthPort::new("unused"),
            Some(TokenPair::new("abc", "r")),
        );
        let client = f.client.clone().with_policy(ClientPolicy {
            auth_scheme: "JWT".into(),
            ..ClientPolicy::default()
        });

        client.send(ApiRequest::get("/me")).await.unwrap();

        assert_eq!(
            f.transport.seen_headers()[0].authorization.as_deref(),
            Some("JWT abc")
        );
    }

    #[tokio::test]
    async fn test_missing_token_fails_without_network() {
        let f = fixture(
            MockTransport::always(ApiResponse::ok(json!({}))),
            MockAuthPort::new("unused"),
            None,
        );

        let error = f.client.send(ApiRequest::get("/tasks")).await.unwrap_err();

        assert_eq!(error.status_class(), StatusClass::SessionExpired);
        assert_eq!(f.transport.calls(), 0);
        assert_eq!(f.auth.refresh_calls(), 0);
        assert!(f.errors.current().is_some());
    }

    #[tokio::test]
    async fn test_expired_token_refreshed_and_retried_transparently() {
        let f = fixture(
            MockTransport::accepting("fresh", json!({"items": [1, 2]})),
            MockAuthPort::new("fresh"),
            Some(TokenPair::new("expired", "r")),
        );

        let response = f.client.send(ApiRequest::get("/tasks")).await.unwrap();

        assert_eq!(response.body, Some(json!({"items": [1, 2]})));
        assert_eq!(f.transport.calls(), 2);
        assert_eq!(f.auth.refresh_calls(), 1);
        assert_eq!(
            f.transport.seen_headers()[1].authorization.as_deref(),
            Some("Bearer fresh")
        );
        assert!(f.errors.current().is_none());
    }

    #[tokio::test]
    async fn test_missing_refresh_token_surfaces_session_expired() {
        let f = fixture(
            MockTransport::accepting("never", json!({})),
            MockAuthPort::new("fresh"),
            Some(TokenPair::new("expired", "")),
        );

        let error = f.client.send(ApiRequest::get("/tasks")).await.unwrap_err();

        assert!(error.is_session_expired());
        assert_eq!(f.auth.refresh_calls(), 0);
        assert_eq!(f.transport.calls(), 1);
        assert!(
            f.errors
                .current()
                .is_some_and(|e| e.status_class() == StatusClass::SessionExpired)
        );
    }

    #[tokio::test]
    async fn test_failed_refresh_clears_session() {
        let auth = MockAuthPort::new("fresh");
        auth.set_refresh_result(Err(RawFailure::http(401, None)));
        let f = fixture(
            MockTransport::accepting("never", json!({})),
            auth,
            Some(TokenPair::new("expired", "r")),
        );

        let error = f.client.send(ApiRequest::get("/tasks")).await.unwrap_err();

        assert!(error.is_session_expired());
        assert!(f.tokens.access_token().is_none());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_session_when_configured() {
        let auth = MockAuthPort::new("fresh");
        auth.set_refresh_result(Err(RawFailure::transport("offline")));
        let f = fixture(
            MockTransport::accepting("never", json!({})),
            auth,
            Some(TokenPair::new("expired", "r")),
        );
        let client = f.client.clone().with_policy(ClientPolicy {
            clear_session_on_refresh_failure: false,
            ..ClientPolicy::default()
        });

        let _ = client.send(ApiRequest::get("/tasks")).await;

        assert_eq!(f.tokens.access_token().as_deref(), Some("expired"));
    }

    #[tokio::test]
    async fn test_retry_happens_at_most_once() {
        let f = fixture(
            MockTransport::always(ApiResponse::new(401, None)),
            MockAuthPort::new("fresh"),
            Some(TokenPair::new("expired", "r")),
        );

        let error = f.client.send(ApiRequest::get("/tasks")).await.unwrap_err();

        assert!(error.is_session_expired());
        assert_eq!(f.transport.calls(), 2);
        assert_eq!(f.auth.refresh_calls(), 1);
        assert!(f.errors.current().is_some());
    }

    #[tokio::test]
    async fn test_validation_returned_but_not_published() {
        let f = fixture(
            MockTransport::always(ApiResponse::new(
                400,
                Some(json!({"title": ["This field is required."]})),
            )),
            MockAuthPort::new("unused"),
            Some(TokenPair::new("abc", "r")),
        );

        let error = f
            .client
            .send(ApiRequest::put("/tasks/1", json!({"title": ""})))
            .await
            .unwrap_err();

        assert_eq!(error.status_class(), StatusClass::Validation);
        assert_eq!(
            error.field_errors().get("title").map(String::as_str),
            Some("This field is required.")
        );
        assert!(f.errors.current().is_none());
    }

    #[tokio::test]
    async fn test_server_fault_published_and_returned() {
        let f = fixture(
            MockTransport::always(ApiResponse::new(500, None)),
            MockAuthPort::new("unused"),
            Some(TokenPair::new("abc", "r")),
        );

        let error = f.client.send(ApiRequest::delete("/tasks/1")).await.unwrap_err();

        assert_eq!(error.status_class(), StatusClass::ServerFault);
        assert_eq!(
            f.errors.current().map(|e| e.status_class()),
            Some(StatusClass::ServerFault)
        );
    }

    #[tokio::test]
    async fn test_transport_failure_is_network() {
        let f = fixture(
            MockTransport::new(|_, _| Err(RawFailure::transport("connection refused"))),
            MockAuthPort::new("unused"),
            Some(TokenPair::new("abc", "r")),
        );

        let error = f.client.send(ApiRequest::get("/tasks")).await.unwrap_err();

        assert_eq!(error.status_class(), StatusClass::Network);
        assert_eq!(f.auth.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn test_success_clears_global_error() {
        let f = fixture(
            MockTransport::always(ApiResponse::ok(json!({}))),
            MockAuthPort::new("unused"),
            Some(TokenPair::new("abc", "r")),
        );
        f.errors
            .publish(crate::application::services::error_classifier::classify_failure(
                RawFailure::http(500, None),
            ));

        f.client.send(ApiRequest::get("/tasks")).await.unwrap();

        assert!(f.errors.current().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_identical_reads_share_one_call() {
        let f = fixture(
            MockTransport::always(ApiResponse::ok(json!({"page": 1})))
                .with_delay(Duration::from_millis(30)),
            MockAuthPort::new("unused"),
            Some(TokenPair::new("abc", "r")),
        );
        let request = ApiRequest::get("/tasks").with_query("page", 1);

        let (a, b) = tokio::join!(f.client.send(request.clone()), f.client.send(request));

        assert_eq!(f.transport.calls(), 1);
        assert_eq!(a.unwrap(), b.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_writes_are_not_coalesced() {
        let f = fixture(
            MockTransport::always(ApiResponse::ok(json!({})))
                .with_delay(Duration::from_millis(10)),
            MockAuthPort::new("unused"),
            Some(TokenPair::new("abc", "r")),
        );
        let request = ApiRequest::new(HttpMethod::Put, "/tasks/1").with_body(json!({"done": true}));

        let (a, b) = tokio::join!(f.client.send(request.clone()), f.client.send(request));

        assert!(a.is_ok() && b.is_ok());
        assert_eq!(f.transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_expired_requests_share_one_refresh() {
        let f = fixture(
            MockTransport::accepting("fresh", json!({})).with_delay(Duration::from_millis(5)),
            MockAuthPort::new("fresh").with_delay(Duration::from_millis(20)),
            Some(TokenPair::new("expired", "r")),
        );

        let (a, b, c) = tokio::join!(
            f.client.send(ApiRequest::get("/a")),
            f.client.send(ApiRequest::get("/b")),
            f.client.send(ApiRequest::get("/c")),
        );

        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(f.auth.refresh_calls(), 1);
    }

    #[tokio::test]
    async fn test_send_json_decodes_body() {
        #[derive(serde::Deserialize)]
        struct Page {
            count: u32,
        }

        let f = fixture(
            MockTransport::always(ApiResponse::ok(json!({"count": 3}))),
            MockAuthPort::new("unused"),
            Some(TokenPair::new("abc", "r")),
        );

        let page: Page = f.client.send_json(ApiRequest::get("/tasks")).await.unwrap();
        assert_eq!(page.count, 3);
    }

    #[tokio::test]
    async fn test_send_json_shape_mismatch_is_unknown() {
        #[derive(Debug, serde::Deserialize)]
        struct Page {
            #[allow(dead_code)]
            count: u32,
        }

        let f = fixture(
            MockTransport::always(ApiResponse::ok(json!({"unexpected": true}))),
            MockAuthPort::new("unused"),
            Some(TokenPair::new("abc", "r")),
        );

        let error = f
            .client
            .send_json::<Page>(ApiRequest::get("/tasks"))
            .await
            .unwrap_err();

        assert_eq!(error.status_class(), StatusClass::Unknown);
        assert!(f.errors.current().is_some());
    }
}
