//! Domain entity definitions.

mod auth_state;
mod credentials;
mod request_key;
mod token;
mod user;

pub use auth_state::{AUTH_STATE_KEY, AuthState};
pub use credentials::Credentials;
pub use request_key::{RequestKey, RequestKeyBuilder};
pub use token::{AuthToken, TokenPair};
pub use user::SessionUser;
