//! Presentation layer: command dispatch and terminal output.

/// Command-line front end.
pub mod cli;

pub use cli::App;
