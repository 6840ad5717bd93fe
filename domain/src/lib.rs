//! Domain layer for courier
//!
//! This crate contains the core entities and value objects of the command
//! bot. It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Session continuity
//!
//! The platform issues an opaque [`Session`] after authentication. Storing it
//! under a sanitized [`SessionId`] lets the bot resume after a restart
//! without a fresh authentication challenge.
//!
//! ## Connection lifecycle
//!
//! [`ConnectionState`] is the supervisor's state machine; [`RetryPolicy`]
//! decides how re-initialization backs off.
//!
//! ## Commands
//!
//! Chat text starting with a [`CommandPrefix`] is parsed into a
//! [`ParsedCommand`] by [`parse_command`]; everything else is ignored.

pub mod command;
pub mod connection;
pub mod core;
pub mod message;
pub mod session;
pub mod util;

// Re-export commonly used types
pub use command::{
    descriptor::CommandDescriptor,
    parsing::{CommandPrefix, ParsedCommand, parse_command},
};
pub use connection::{
    retry::{RetryDecision, RetryPolicy},
    state::ConnectionState,
};
pub use core::error::DomainError;
pub use message::{InboundMessage, MessageRef};
pub use session::{
    entities::{Session, SessionId, sanitize},
    repository::{PersistenceMode, SessionStore, SessionStoreError},
};
