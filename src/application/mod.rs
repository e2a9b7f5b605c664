//! Application layer with session services, use cases and DTOs.

/// Data transfer objects.
pub mod dto;
/// Session services.
pub mod services;
/// Use case implementations.
pub mod use_cases;

pub use dto::{LoginRequest, LoginResponse, LogoutResponse};
pub use services::{
    AuthenticatedClient, ClientPolicy, CurrentKey, ErrorClassifier, FetchDeduper,
    GlobalErrorChannel, TokenLifecycleManager,
};
pub use use_cases::{LoginUseCase, LogoutUseCase};
