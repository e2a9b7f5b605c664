//! Session services shared by every request path.

mod authenticated_client;
pub mod error_classifier;
mod fetch_deduper;
mod global_error_channel;
mod token_lifecycle;

pub use authenticated_client::{AuthenticatedClient, ClientPolicy};
pub use error_classifier::{ErrorClassifier, classify_failure};
pub use fetch_deduper::{CurrentKey, FetchDeduper};
pub use global_error_channel::GlobalErrorChannel;
pub use token_lifecycle::TokenLifecycleManager;
