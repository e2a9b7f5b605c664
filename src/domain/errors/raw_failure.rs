//! Unclassified failure shapes as they come off the wire.

use std::fmt;

use serde_json::Value;

/// A failure before it has been mapped onto the error taxonomy.
#[derive(Debug, Clone, PartialEq)]
pub enum RawFailure {
    /// Request never produced a response (DNS, connect, TLS, timeout).
    Transport { message: String, timeout: bool },

    /// Failure raised locally without any response object.
    Application { message: String },

    /// Backend answered with a non-success status.
    Http { status: u16, body: Option<Value> },

    /// Backend answered, but the body did not have the expected shape.
    Decode { status: u16, message: String },
}

impl RawFailure {
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            timeout: false,
        }
    }

    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            timeout: true,
        }
    }

    #[must_use]
    pub fn application(message: impl Into<String>) -> Self {
        Self::Application {
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn http(status: u16, body: Option<Value>) -> Self {
        Self::Http { status, body }
    }

    #[must_use]
    pub fn decode(status: u16, message: impl Into<String>) -> Self {
        Self::Decode {
            status,
            message: message.into(),
        }
    }

    /// Status code when a response was received.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } | Self::Decode { status, .. } => Some(*status),
            Self::Transport { .. } | Self::Application { .. } => None,
        }
    }

    /// Response body when a response was received.
    #[must_use]
    pub const fn body(&self) -> Option<&Value> {
        match self {
            Self::Http { body, .. } => body.as_ref(),
            Self::Transport { .. } | Self::Application { .. } | Self::Decode { .. } => None,
        }
    }
}

impl fmt::Display for RawFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport {
                message,
                timeout: true,
            } => write!(f, "request timed out: {message}"),
            Self::Transport { message, .. } => write!(f, "transport failure: {message}"),
            Self::Application { message } => write!(f, "application error: {message}"),
            Self::Http { status, .. } => write!(f, "HTTP {status}"),
            Self::Decode { status, message } => {
                write!(f, "unexpected body in HTTP {status} response: {message}")
            }
        }
    }
}
