//! Command Registry
//!
//! The [`CommandRegistry`] maps command names to handlers and owns the
//! parsing rule that turns chat text into a [`ParsedCommand`].
//!
//! # Usage
//!
//! ```ignore
//! let mut registry = CommandRegistry::new(CommandPrefix::DEFAULT);
//! registry.register(CommandDescriptor::new("ping", "Speed test")?, PingCommand)?;
//!
//! // Freeze before dispatching; the registry is read-only from here on.
//! let registry = Arc::new(registry);
//! ```
//!
//! # Read-only after startup
//!
//! Registration needs `&mut self`, so once the registry is shared behind an
//! `Arc` it can no longer change. Concurrent dispatches only ever read it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use courier_domain::{CommandDescriptor, CommandPrefix, ParsedCommand, parse_command};
use thiserror::Error;

use crate::config::{BotConfig, ForwardMode};
use crate::ports::platform_client::PlatformError;
use crate::use_cases::commands::{
    ForwardCurrentCommand, ForwardQuotedCommand, JidCommand, MenuCommand, PingCommand,
};
use crate::use_cases::context::CommandContext;

/// Errors raised while building the registry (fatal at startup)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Command '{0}' is already registered")]
    Duplicate(String),

    #[error("Invalid command definition: {0}")]
    InvalidDefinition(String),
}

/// Errors raised while a handler runs
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Platform call failed: {0}")]
    Platform(#[from] PlatformError),

    #[error("Handler timed out after {0:?}")]
    Timeout(Duration),

    #[error("Handler panicked")]
    Panicked,

    #[error("{0}")]
    Failed(String),
}

/// Behaviour behind a command name
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(
        &self,
        ctx: &CommandContext,
        command: &ParsedCommand,
    ) -> Result<(), HandlerError>;
}

/// A descriptor bound to its handler
#[derive(Clone)]
pub struct RegisteredCommand {
    descriptor: CommandDescriptor,
    handler: Arc<dyn CommandHandler>,
}

impl RegisteredCommand {
    pub fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    pub fn handler(&self) -> Arc<dyn CommandHandler> {
        Arc::clone(&self.handler)
    }
}

/// Name → handler table plus the parsing rule
pub struct CommandRegistry {
    prefix: CommandPrefix,
    /// Registration order, used for the menu
    commands: Vec<RegisteredCommand>,
    /// Command name -> index into `commands`
    index: HashMap<String, usize>,
}

impl CommandRegistry {
    /// Create an empty registry
    pub fn new(prefix: CommandPrefix) -> Self {
        Self {
            prefix,
            commands: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Registry with the built-in commands (`menu`, `ping`, `jid`, `forward`).
    ///
    /// `config.forward_mode` selects which forward variant owns the name.
    pub fn with_builtins(config: &BotConfig) -> Result<Self, RegistryError> {
        let mut registry = Self::new(config.prefix);

        registry.register(descriptor("menu", "Show menu", None)?, MenuCommand)?;
        registry.register(descriptor("ping", "Speed test", None)?, PingCommand)?;
        registry.register(descriptor("jid", "Get chat ID", None)?, JidCommand)?;

        match config.forward_mode {
            ForwardMode::Current => registry.register(
                descriptor("forward", "Forward message", Some("<jid>"))?,
                ForwardCurrentCommand,
            )?,
            ForwardMode::Quoted => registry.register(
                descriptor("forward", "Forward the quoted message", Some("<jid>"))?,
                ForwardQuotedCommand,
            )?,
        }

        Ok(registry)
    }

    /// Register a handler.
    ///
    /// Fails when the name is taken; there is no silent override.
    pub fn register<H: CommandHandler + 'static>(
        &mut self,
        descriptor: CommandDescriptor,
        handler: H,
    ) -> Result<(), RegistryError> {
        self.register_arc(descriptor, Arc::new(handler))
    }

    /// Register a shared handler (Arc version)
    pub fn register_arc(
        &mut self,
        descriptor: CommandDescriptor,
        handler: Arc<dyn CommandHandler>,
    ) -> Result<(), RegistryError> {
        let name = descriptor.name().to_string();
        if self.index.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }

        tracing::debug!(command = %name, "Registered command");
        self.index.insert(name, self.commands.len());
        self.commands.push(RegisteredCommand {
            descriptor,
            handler,
        });
        Ok(())
    }

    /// Find the command registered under `name`
    pub fn lookup(&self, name: &str) -> Option<&RegisteredCommand> {
        self.index.get(name).map(|&i| &self.commands[i])
    }

    /// Parse chat text with this registry's prefix
    pub fn parse(&self, text: &str) -> Option<ParsedCommand> {
        parse_command(text, self.prefix)
    }

    pub fn prefix(&self) -> CommandPrefix {
        self.prefix
    }

    /// Descriptors in registration order
    pub fn descriptors(&self) -> impl Iterator<Item = &CommandDescriptor> {
        self.commands.iter().map(|c| &c.descriptor)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

fn descriptor(
    name: &str,
    description: &str,
    usage: Option<&str>,
) -> Result<CommandDescriptor, RegistryError> {
    let descriptor = CommandDescriptor::new(name, description)
        .map_err(|e| RegistryError::InvalidDefinition(e.to_string()))?;
    Ok(match usage {
        Some(usage) => descriptor.with_usage(usage),
        None => descriptor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_domain::SessionId;

    struct Noop;

    #[async_trait]
    impl CommandHandler for Noop {
        async fn handle(
            &self,
            _ctx: &CommandContext,
            _command: &ParsedCommand,
        ) -> Result<(), HandlerError> {
            Ok(())
        }
    }

    fn config() -> BotConfig {
        BotConfig::new(SessionId::parse("test").unwrap())
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = CommandRegistry::new(CommandPrefix::DEFAULT);
        registry
            .register(CommandDescriptor::new("hello", "Say hi").unwrap(), Noop)
            .unwrap();

        assert!(registry.lookup("hello").is_some());
        assert!(registry.lookup("frobnicate").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = CommandRegistry::new(CommandPrefix::DEFAULT);
        registry
            .register(CommandDescriptor::new("hello", "first").unwrap(), Noop)
            .unwrap();
        let err = registry
            .register(CommandDescriptor::new("hello", "second").unwrap(), Noop)
            .unwrap_err();

        assert_eq!(err, RegistryError::Duplicate("hello".to_string()));
        assert_eq!(
            registry.lookup("hello").unwrap().descriptor().description(),
            "first"
        );
    }

    #[test]
    fn test_builtins_in_menu_order() {
        let registry = CommandRegistry::with_builtins(&config()).unwrap();
        let names: Vec<&str> = registry.descriptors().map(|d| d.name()).collect();
        assert_eq!(names, vec!["menu", "ping", "jid", "forward"]);
    }

    #[test]
    fn test_forward_mode_selects_variant() {
        let current = CommandRegistry::with_builtins(&config()).unwrap();
        let quoted =
            CommandRegistry::with_builtins(&config().with_forward_mode(ForwardMode::Quoted))
                .unwrap();

        assert_eq!(
            current.lookup("forward").unwrap().descriptor().description(),
            "Forward message"
        );
        assert_eq!(
            quoted.lookup("forward").unwrap().descriptor().description(),
            "Forward the quoted message"
        );
    }

    #[test]
    fn test_parse_uses_registry_prefix() {
        let registry = CommandRegistry::new("!".parse().unwrap());
        assert!(registry.parse(".menu").is_none());
        assert_eq!(registry.parse("!menu").unwrap().name, "menu");
    }

    #[test]
    fn test_unknown_command_parses_but_does_not_match() {
        let registry = CommandRegistry::with_builtins(&config()).unwrap();
        let parsed = registry.parse(".frobnicate").unwrap();
        assert!(registry.lookup(&parsed.name).is_none());
    }
}
