//! Authentication DTOs.

use crate::domain::entities::{Credentials, SessionUser};

/// Login request data.
#[derive(Debug, Clone)]
pub struct LoginRequest {
    /// Submitted credentials.
    pub credentials: Credentials,
}

impl LoginRequest {
    /// Creates new login request.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            credentials: Credentials::new(username, password),
        }
    }
}

/// Login response data.
#[derive(Debug, Clone)]
pub struct LoginResponse {
    /// Authenticated user, when the backend reports one.
    pub user: Option<SessionUser>,
}

impl LoginResponse {
    /// Creates new login response.
    #[must_use]
    pub const fn new(user: Option<SessionUser>) -> Self {
        Self { user }
    }
}

/// Logout result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogoutResponse {
    /// Whether the backend confirmed the refresh token was blacklisted.
    pub revoked: bool,
}
