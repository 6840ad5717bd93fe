//! Domain error types

use thiserror::Error;

/// Domain-level errors
///
/// These are raised while constructing value objects from raw configuration
/// and are always fatal at startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Session id {raw:?} contains no characters from [A-Za-z0-9_-]")]
    EmptySessionId { raw: String },

    #[error("Invalid retry policy: {0}")]
    InvalidRetryPolicy(String),

    #[error("Invalid command prefix {0:?}: must be a single non-whitespace character")]
    InvalidCommandPrefix(String),

    #[error("Invalid command name {0:?}")]
    InvalidCommandName(String),
}
