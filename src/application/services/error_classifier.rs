//! Maps raw failures onto the error taxonomy.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::domain::errors::{ClassifiedError, RawFailure, StatusClass};
use crate::domain::ports::ErrorReporterPort;

const NON_FIELD_KEYS: [&str; 2] = ["non_field_errors", "nonFieldErrors"];

/// Classifies failures and hands every result to the reporter.
#[derive(Clone)]
pub struct ErrorClassifier {
    reporter: Arc<dyn ErrorReporterPort>,
}

impl ErrorClassifier {
    #[must_use]
    pub fn new(reporter: Arc<dyn ErrorReporterPort>) -> Self {
        Self { reporter }
    }

    /// Classifies `raw` and reports the result.
    #[must_use]
    pub fn classify(&self, raw: RawFailure) -> ClassifiedError {
        let classified = classify_failure(raw);
        self.reporter.report(&classified);
        classified
    }

    /// Validation error raised before any request was made.
    #[must_use]
    pub fn local_validation(&self, field_errors: BTreeMap<String, String>) -> ClassifiedError {
        let message = field_errors.values().next().cloned().unwrap_or_default();
        let classified = ClassifiedError::validation(
            message,
            field_errors,
            Vec::new(),
            RawFailure::application("rejected before sending"),
        );
        self.reporter.report(&classified);
        classified
    }

    /// Session-expired error for requests that never had a token to send.
    #[must_use]
    pub fn missing_token(&self) -> ClassifiedError {
        let classified = ClassifiedError::displayable(
            StatusClass::SessionExpired,
            RawFailure::application("no access token available"),
            None,
        );
        self.reporter.report(&classified);
        classified
    }
}

/// Pure decision tree; the first matching rule wins.
#[must_use]
pub fn classify_failure(raw: RawFailure) -> ClassifiedError {
    let Some(status) = raw.status() else {
        return ClassifiedError::displayable(StatusClass::Network, raw, None);
    };

    let class = match status {
        401 => StatusClass::SessionExpired,
        403 => StatusClass::Forbidden,
        500..=599 => StatusClass::ServerFault,
        400 => match extract_validation(raw.body()) {
            Some((field_errors, non_field_errors)) => {
                let message = validation_message(&field_errors, &non_field_errors, raw.body());
                return ClassifiedError::validation(message, field_errors, non_field_errors, raw);
            }
            None => StatusClass::Unknown,
        },
        _ => StatusClass::Unknown,
    };

    let detail = server_detail(raw.body());
    ClassifiedError::displayable(class, raw, detail)
}

fn server_detail(body: Option<&Value>) -> Option<String> {
    let body = body?.as_object()?;
    body.get("message")
        .or_else(|| body.get("detail"))
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

fn extract_validation(body: Option<&Value>) -> Option<(BTreeMap<String, String>, Vec<String>)> {
    let object = body?.as_object()?;
    if object.is_empty() {
        return None;
    }

    let mut field_errors = BTreeMap::new();
    let mut non_field_errors = Vec::new();

    for (field, value) in object {
        if NON_FIELD_KEYS.contains(&field.as_str()) {
            match value {
                Value::Array(items) => non_field_errors.extend(items.iter().map(message_text)),
                other => non_field_errors.push(message_text(other)),
            }
        } else if let Some(message) = first_message(value) {
            field_errors.insert(field.clone(), message);
        }
    }

    Some((field_errors, non_field_errors))
}

fn first_message(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => items.first().map(message_text),
        other => Some(message_text(other)),
    }
}

fn message_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn validation_message(
    field_errors: &BTreeMap<String, String>,
    non_field_errors: &[String],
    body: Option<&Value>,
) -> String {
    non_field_errors
        .first()
        .or_else(|| field_errors.values().next())
        .cloned()
        .unwrap_or_else(|| body.map(ToString::to_string).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::mocks::MockErrorReporterPort;
    use serde_json::json;
    use test_case::test_case;

    fn http(status: u16, body: Value) -> RawFailure {
        RawFailure::http(status, Some(body))
    }

    #[test]
    fn test_missing_response_is_network() {
        let error = classify_failure(RawFailure::transport("connection refused"));

        assert_eq!(error.status_class(), StatusClass::Network);
        assert_eq!(error.translation_key(), "errors.network");
        assert_eq!(error.status(), None);
    }

    #[test]
    fn test_application_error_without_response_is_network() {
        let error = classify_failure(RawFailure::application("boom"));
        assert_eq!(error.status_class(), StatusClass::Network);
    }

    #[test_case(401, json!({}), "errors.sessionExpired" ; "401 empty body")]
    #[test_case(401, json!({"detail": "Token is invalid"}), "errors.sessionExpired" ; "401 with detail")]
    #[test_case(403, json!({"message": "nope"}), "errors.forbidden" ; "403 with message")]
    #[test_case(403, json!(null), "errors.forbidden" ; "403 null body")]
    #[test_case(500, json!({"email": ["bad"]}), "errors.server" ; "500 field shaped body")]
    #[test_case(503, json!("down"), "errors.server" ; "503 text body")]
    fn test_fixed_translation_keys(status: u16, body: Value, key: &str) {
        let error = classify_failure(http(status, body));

        assert_eq!(error.translation_key(), key);
        assert!(error.field_errors().is_empty());
        assert!(error.non_field_errors().is_empty());
    }

    #[test_case(401, StatusClass::SessionExpired)]
    #[test_case(403, StatusClass::Forbidden)]
    #[test_case(500, StatusClass::ServerFault)]
    #[test_case(502, StatusClass::ServerFault)]
    #[test_case(599, StatusClass::ServerFault)]
    #[test_case(404, StatusClass::Unknown)]
    #[test_case(409, StatusClass::Unknown)]
    #[test_case(429, StatusClass::Unknown)]
    fn test_status_mapping(status: u16, expected: StatusClass) {
        let error = classify_failure(RawFailure::http(status, None));
        assert_eq!(error.status_class(), expected);
    }

    #[test]
    fn test_default_messages_for_displayable_classes() {
        let error = classify_failure(http(401, json!({"detail": "whatever"})));

        assert_eq!(
            error.message(),
            "Your session has expired. Please log in again."
        );
        assert_eq!(error.server_detail(), Some("whatever"));
    }

    #[test]
    fn test_message_preferred_over_detail() {
        let error = classify_failure(http(500, json!({"message": "m", "detail": "d"})));
        assert_eq!(error.server_detail(), Some("m"));
    }

    #[test]
    fn test_field_array_takes_first_message() {
        let error = classify_failure(http(
            400,
            json!({"email": ["Enter a valid email.", "Too long."]}),
        ));

        assert_eq!(error.status_class(), StatusClass::Validation);
        assert_eq!(
            error.field_errors().get("email").map(String::as_str),
            Some("Enter a valid email.")
        );
        assert_eq!(error.message(), "Enter a valid email.");
    }

    #[test]
    fn test_field_string_value() {
        let error = classify_failure(http(400, json!({"title": "This field is required."})));

        assert_eq!(
            error.field_errors().get("title").map(String::as_str),
            Some("This field is required.")
        );
    }

    #[test]
    fn test_non_field_errors_ordered_and_excluded_from_fields() {
        let error = classify_failure(http(
            400,
            json!({
                "non_field_errors": ["first", "second", "third"],
                "name": ["taken"],
            }),
        ));

        assert_eq!(error.non_field_errors(), ["first", "second", "third"]);
        assert!(!error.field_errors().contains_key("non_field_errors"));
        assert_eq!(error.field_errors().len(), 1);
        assert_eq!(error.message(), "first");
    }

    #[test]
    fn test_camel_case_non_field_key() {
        let error = classify_failure(http(400, json!({"nonFieldErrors": ["dates overlap"]})));

        assert_eq!(error.non_field_errors(), ["dates overlap"]);
        assert!(error.field_errors().is_empty());
    }

    #[test]
    fn test_non_string_field_value_falls_back_to_raw_text() {
        let error = classify_failure(http(400, json!({"quantity": {"min": 1}})));

        assert_eq!(
            error.field_errors().get("quantity").map(String::as_str),
            Some(r#"{"min":1}"#)
        );
    }

    #[test]
    fn test_validation_has_no_server_detail() {
        let error = classify_failure(http(400, json!({"detail": "bad input"})));

        assert_eq!(error.status_class(), StatusClass::Validation);
        assert_eq!(error.message(), "bad input");
        assert!(error.server_detail().is_none());
    }

    #[test_case(json!({}) ; "empty object")]
    #[test_case(json!(["oops"]) ; "array body")]
    #[test_case(json!("bad request") ; "string body")]
    fn test_unshaped_400_is_unknown(body: Value) {
        let error = classify_failure(http(400, body));

        assert_eq!(error.status_class(), StatusClass::Unknown);
        assert_eq!(error.translation_key(), "errors.server");
    }

    #[test]
    fn test_undecodable_success_body_is_unknown() {
        let error = classify_failure(RawFailure::decode(200, "missing field `count`"));

        assert_eq!(error.status_class(), StatusClass::Unknown);
        assert_eq!(error.status(), Some(200));
    }

    #[test]
    fn test_400_without_body_is_unknown() {
        let error = classify_failure(RawFailure::http(400, None));
        assert_eq!(error.status_class(), StatusClass::Unknown);
    }

    #[test]
    fn test_every_classification_is_reported() {
        let mut reporter = MockErrorReporterPort::new();
        reporter.expect_report().times(3).return_const(());
        let classifier = ErrorClassifier::new(Arc::new(reporter));

        let _ = classifier.classify(RawFailure::transport("down"));
        let _ = classifier.classify(http(400, json!({"a": ["b"]})));
        let _ = classifier.missing_token();
    }

    #[test]
    fn test_reporter_sees_classified_value() {
        let mut reporter = MockErrorReporterPort::new();
        reporter
            .expect_report()
            .withf(|error| error.status_class() == StatusClass::Forbidden)
            .times(1)
            .return_const(());
        let classifier = ErrorClassifier::new(Arc::new(reporter));

        let error = classifier.classify(RawFailure::http(403, None));
        assert_eq!(error.status_class(), StatusClass::Forbidden);
    }

    #[test]
    fn test_missing_token_is_session_expired_without_status() {
        let mut reporter = MockErrorReporterPort::new();
        reporter.expect_report().return_const(());
        let classifier = ErrorClassifier::new(Arc::new(reporter));

        let error = classifier.missing_token();

        assert!(error.is_session_expired());
        assert_eq!(error.status(), None);
    }
}
