//! Per-dispatch command context

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use courier_domain::{CommandDescriptor, CommandPrefix, InboundMessage, MessageRef};

use crate::ports::platform_client::{PlatformClient, PlatformError};
use crate::use_cases::command_registry::CommandRegistry;

/// What a handler may do while answering one message.
///
/// Owns the inbound message, so replies always go back to the conversation
/// the command came from. Every platform call is bounded by the call
/// timeout.
pub struct CommandContext {
    client: Arc<dyn PlatformClient>,
    registry: Arc<CommandRegistry>,
    message: InboundMessage,
    bot_name: Arc<str>,
    call_timeout: Duration,
}

impl CommandContext {
    pub fn new(
        client: Arc<dyn PlatformClient>,
        registry: Arc<CommandRegistry>,
        message: InboundMessage,
        bot_name: Arc<str>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            client,
            registry,
            message,
            bot_name,
            call_timeout,
        }
    }

    /// Conversation the command arrived in
    pub fn sender_id(&self) -> &str {
        &self.message.sender_id
    }

    pub fn message(&self) -> &InboundMessage {
        &self.message
    }

    pub fn bot_name(&self) -> &str {
        &self.bot_name
    }

    pub fn prefix(&self) -> CommandPrefix {
        self.registry.prefix()
    }

    /// Every registered command, in registration order
    pub fn commands(&self) -> impl Iterator<Item = &CommandDescriptor> {
        self.registry.descriptors()
    }

    /// Send `text` to the sender's conversation
    pub async fn reply(&self, text: &str) -> Result<MessageRef, PlatformError> {
        self.bounded(self.client.send_message(&self.message.sender_id, text))
            .await
    }

    /// Replace the text of a message the bot sent earlier
    pub async fn edit(&self, message: &MessageRef, text: &str) -> Result<(), PlatformError> {
        self.bounded(self.client.edit_message(message, text)).await
    }

    /// Forward the message being handled to `target`
    pub async fn forward(&self, target: &str) -> Result<(), PlatformError> {
        self.forward_message(&self.message.id, target).await
    }

    /// Forward an arbitrary message to `target`
    pub async fn forward_message(
        &self,
        message: &MessageRef,
        target: &str,
    ) -> Result<(), PlatformError> {
        self.bounded(self.client.forward_message(message, target))
            .await
    }

    /// The message this one replies to, resolved through the platform.
    ///
    /// Returns `None` without a platform call when the message quotes nothing.
    pub async fn quoted(&self) -> Result<Option<InboundMessage>, PlatformError> {
        if !self.message.is_reply() {
            return Ok(None);
        }
        self.bounded(self.client.get_quoted_message(&self.message.id))
            .await
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, PlatformError>>,
    ) -> Result<T, PlatformError> {
        tokio::time::timeout(self.call_timeout, call)
            .await
            .map_err(|_| PlatformError::Timeout)?
    }
}
