//! Backend HTTP adapters.

mod auth_client;
mod dto;
mod transport;

pub use auth_client::{AuthEndpoints, HttpAuthClient};
pub use transport::{ReqwestTransport, TransportError};
