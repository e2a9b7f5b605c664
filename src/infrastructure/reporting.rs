//! Error reporting through `tracing`.

use tracing::{debug, error, warn};

use crate::domain::errors::{ClassifiedError, StatusClass};
use crate::domain::ports::ErrorReporterPort;

/// Logs every classified failure once, with its raw cause.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorReporter;

impl TracingErrorReporter {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ErrorReporterPort for TracingErrorReporter {
    fn report(&self, classified: &ClassifiedError) {
        let class = classified.status_class();
        let status = classified.status();
        let raw = classified.original();

        match class {
            StatusClass::Validation => debug!(
                status,
                fields = classified.field_errors().len(),
                message = classified.message(),
                "Request rejected by validation"
            ),
            StatusClass::ServerFault | StatusClass::Unknown => error!(
                %class,
                status,
                detail = classified.server_detail(),
                raw = %raw,
                "Request failed"
            ),
            StatusClass::Network | StatusClass::SessionExpired | StatusClass::Forbidden => warn!(
                %class,
                status,
                raw = %raw,
                "Request failed"
            ),
        }
    }
}
