//! Persisted session record.

use serde::{Deserialize, Serialize};

use super::token::{AuthToken, TokenPair};
use super::user::SessionUser;

/// Storage key under which the session record lives.
pub const AUTH_STATE_KEY: &str = "authState";

/// Session snapshot mirrored into secure storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    #[serde(default)]
    pub is_authenticated: bool,
    #[serde(default)]
    pub user: Option<SessionUser>,
    #[serde(default)]
    pub access_token: Option<AuthToken>,
    #[serde(default)]
    pub refresh_token: Option<AuthToken>,
}

impl AuthState {
    /// Builds an authenticated state from a token pair.
    #[must_use]
    pub fn from_pair(pair: TokenPair, user: Option<SessionUser>) -> Self {
        Self {
            is_authenticated: pair.has_access(),
            user,
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        }
    }

    /// Returns a copy of the token pair.
    #[must_use]
    pub fn pair(&self) -> TokenPair {
        TokenPair {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
        }
    }

    /// Serializes to the storage representation.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses the storage representation.
    ///
    /// # Errors
    /// Returns error if the record is malformed.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let mut state: Self = serde_json::from_str(raw)?;
        state.is_authenticated = state.is_authenticated && state.access_token.is_some();
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_shape_is_camel_case() {
        let state = AuthState::from_pair(
            TokenPair::new("access", "refresh"),
            Some(SessionUser::new("1", "ada")),
        );
        let value: serde_json::Value = serde_json::from_str(&state.to_json().unwrap()).unwrap();

        assert_eq!(value["isAuthenticated"], true);
        assert_eq!(value["accessToken"], "access");
        assert_eq!(value["refreshToken"], "refresh");
        assert_eq!(value["user"]["username"], "ada");
    }

    #[test]
    fn test_parse_record_with_numeric_user_id() {
        let raw = r#"{"isAuthenticated":true,"user":{"id":5,"username":"bob"},"accessToken":"a","refreshToken":null}"#;
        let state = AuthState::from_json(raw).unwrap();

        assert!(state.is_authenticated);
        assert_eq!(state.user.unwrap().id(), "5");
        assert_eq!(state.access_token.unwrap().as_str(), "a");
        assert!(state.refresh_token.is_none());
    }

    #[test]
    fn test_authenticated_flag_requires_access_token() {
        let raw = r#"{"isAuthenticated":true,"user":null,"accessToken":null,"refreshToken":"r"}"#;
        let state = AuthState::from_json(raw).unwrap();

        assert!(!state.is_authenticated);
    }
}
