//! Domain error types.

mod classified_error;
mod raw_failure;
mod secret_error;

pub use classified_error::{ClassifiedError, StatusClass};
pub use raw_failure::RawFailure;
pub use secret_error::SecretError;
