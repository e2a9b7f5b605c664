//! Normalized error taxonomy.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use super::RawFailure;

/// Stable error categories shared by every backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    Network,
    SessionExpired,
    Forbidden,
    ServerFault,
    Validation,
    Unknown,
}

impl StatusClass {
    /// Translation key the presentation layer looks up.
    #[must_use]
    pub const fn translation_key(self) -> &'static str {
        match self {
            Self::Network => "errors.network",
            Self::SessionExpired => "errors.sessionExpired",
            Self::Forbidden => "errors.forbidden",
            Self::ServerFault | Self::Unknown => "errors.server",
            Self::Validation => "errors.validation",
        }
    }

    /// English fallback message; `None` for validation errors.
    #[must_use]
    pub const fn default_message(self) -> Option<&'static str> {
        match self {
            Self::Network => {
                Some("Unable to reach the server. Check your connection and try again.")
            }
            Self::SessionExpired => Some("Your session has expired. Please log in again."),
            Self::Forbidden => Some("You do not have permission to perform this action."),
            Self::ServerFault | Self::Unknown => {
                Some("Something went wrong on our side. Please try again later.")
            }
            Self::Validation => None,
        }
    }

    /// Whether errors of this class interrupt the user globally.
    #[must_use]
    pub const fn is_globally_displayable(self) -> bool {
        !matches!(self, Self::Validation)
    }
}

impl fmt::Display for StatusClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Network => "network",
            Self::SessionExpired => "session_expired",
            Self::Forbidden => "forbidden",
            Self::ServerFault => "server_fault",
            Self::Validation => "validation",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A failure mapped onto [`StatusClass`], immutable once built.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ClassifiedError {
    status_class: StatusClass,
    message: String,
    translation_key: &'static str,
    field_errors: BTreeMap<String, String>,
    non_field_errors: Vec<String>,
    server_detail: Option<String>,
    original: RawFailure,
}

impl ClassifiedError {
    /// Builds an error for one of the classes with a fixed message.
    #[must_use]
    pub fn displayable(
        status_class: StatusClass,
        original: RawFailure,
        server_detail: Option<String>,
    ) -> Self {
        Self {
            status_class,
            message: status_class
                .default_message()
                .unwrap_or_default()
                .to_string(),
            translation_key: status_class.translation_key(),
            field_errors: BTreeMap::new(),
            non_field_errors: Vec::new(),
            server_detail,
            original,
        }
    }

    /// Builds a field-scoped validation error.
    #[must_use]
    pub fn validation(
        message: impl Into<String>,
        field_errors: BTreeMap<String, String>,
        non_field_errors: Vec<String>,
        original: RawFailure,
    ) -> Self {
        Self {
            status_class: StatusClass::Validation,
            message: message.into(),
            translation_key: StatusClass::Validation.translation_key(),
            field_errors,
            non_field_errors,
            server_detail: None,
            original,
        }
    }

    #[must_use]
    pub const fn status_class(&self) -> StatusClass {
        self.status_class
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub const fn translation_key(&self) -> &'static str {
        self.translation_key
    }

    #[must_use]
    pub const fn field_errors(&self) -> &BTreeMap<String, String> {
        &self.field_errors
    }

    #[must_use]
    pub fn non_field_errors(&self) -> &[String] {
        &self.non_field_errors
    }

    /// `message`/`detail` text sent by the backend, if any.
    #[must_use]
    pub fn server_detail(&self) -> Option<&str> {
        self.server_detail.as_deref()
    }

    /// HTTP status when the failure carried a response.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        self.original.status()
    }

    /// Underlying failure, for diagnostics only.
    #[must_use]
    pub const fn original(&self) -> &RawFailure {
        &self.original
    }

    #[must_use]
    pub const fn is_session_expired(&self) -> bool {
        matches!(self.status_class, StatusClass::SessionExpired)
    }

    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self.status_class, StatusClass::Validation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_shares_server_presentation() {
        assert_eq!(
            StatusClass::Unknown.translation_key(),
            StatusClass::ServerFault.translation_key()
        );
        assert_eq!(
            StatusClass::Unknown.default_message(),
            StatusClass::ServerFault.default_message()
        );
        assert_ne!(StatusClass::Unknown, StatusClass::ServerFault);
    }

    #[test]
    fn test_only_validation_is_field_scoped() {
        assert!(!StatusClass::Validation.is_globally_displayable());
        assert!(StatusClass::Network.is_globally_displayable());
        assert!(StatusClass::Unknown.is_globally_displayable());
    }

    #[test]
    fn test_display_uses_message() {
        let error = ClassifiedError::displayable(
            StatusClass::Forbidden,
            RawFailure::http(403, None),
            None,
        );

        assert_eq!(
            error.to_string(),
            "You do not have permission to perform this action."
        );
        assert_eq!(error.status(), Some(403));
    }
}
