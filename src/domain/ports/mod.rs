mod auth_port;
mod error_reporter_port;
mod http_transport_port;
mod locale_port;
mod secure_storage_port;

pub use auth_port::{AuthPort, RefreshGrant, TokenGrant};
pub use error_reporter_port::ErrorReporterPort;
pub use http_transport_port::{ApiRequest, ApiResponse, HttpMethod, HttpTransport, RequestHeaders};
pub use locale_port::LocalePort;
pub use secure_storage_port::SecureStoragePort;
