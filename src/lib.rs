//! Session Guard - client-side session core for token-authenticated APIs.
//!
//! This crate keeps an access/refresh token pair alive, attaches it to
//! outgoing requests, recovers from expired sessions with a single shared
//! refresh, classifies failures into a small user-facing taxonomy and
//! coalesces duplicate in-flight reads.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing session services, use cases and DTOs.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;
/// Presentation layer containing the command-line front end.
pub mod presentation;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "session-guard";
