//! Domain layer with core session entities, the error taxonomy and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;
/// Serde utilities.
pub mod serde_utils;

pub use entities::{AuthState, AuthToken, RequestKey, SessionUser, TokenPair};
pub use errors::{ClassifiedError, RawFailure, StatusClass};
pub use ports::{AuthPort, ErrorReporterPort, HttpTransport, LocalePort, SecureStoragePort};
