//! Error reporting port definition.

use crate::domain::errors::ClassifiedError;

/// Sink that receives every classified failure.
///
/// Implementations must not block and must not fail.
#[cfg_attr(test, mockall::automock)]
pub trait ErrorReporterPort: Send + Sync {
    /// Records a classified failure.
    fn report(&self, error: &ClassifiedError);
}
