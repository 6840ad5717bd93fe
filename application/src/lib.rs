//! Application layer for courier
//!
//! This crate contains the connection supervisor, the command dispatcher,
//! the built-in commands and the ports adapters plug into.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::{BotConfig, ForwardMode};
pub use ports::{
    auth_presenter::AuthChallengePresenter,
    operator_notifier::{OperatorNotice, OperatorNotifier},
    platform_client::{PlatformClient, PlatformError, PlatformEvent},
};
pub use use_cases::bot_runtime::BotRuntime;
pub use use_cases::command_registry::{
    CommandHandler, CommandRegistry, HandlerError, RegisteredCommand, RegistryError,
};
pub use use_cases::connection_supervisor::{
    ConnectionSupervisor, InitializeOutcome, SupervisorError, SupervisorExit, SupervisorSettings,
};
pub use use_cases::context::CommandContext;
pub use use_cases::dispatcher::{CommandDispatcher, DispatchOutcome, DispatchSettings};
pub use use_cases::status::{StatusBoard, StatusSnapshot};
