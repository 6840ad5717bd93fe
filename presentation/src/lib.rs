//! Presentation layer for courier
//!
//! This crate contains the CLI definition, operator-facing console output
//! and the HTTP health surface.

pub mod cli;
pub mod health;
pub mod output;

// Re-export commonly used types
pub use cli::commands::Cli;
pub use health::{health_router, serve};
pub use output::console::{ConsoleAuthPresenter, ConsoleFormatter, ConsoleOperatorNotifier};
