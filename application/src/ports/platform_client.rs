//! Platform client port
//!
//! Defines the capability set the bot needs from a messaging platform SDK.
//! Any client that can connect with an optional session, emit lifecycle
//! events and send/forward/edit messages is interchangeable.

use async_trait::async_trait;
use courier_domain::{InboundMessage, MessageRef, Session};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur during platform client operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Authentication rejected: {0}")]
    AuthenticationRejected(String),

    #[error("Operation not supported by platform: {0}")]
    Unsupported(&'static str),

    #[error("Message not found: {0}")]
    MessageNotFound(String),

    #[error("Client not connected")]
    NotConnected,

    #[error("Timeout")]
    Timeout,
}

impl PlatformError {
    /// Transport-level failures are recovered by re-initializing the client
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            PlatformError::Transport(_) | PlatformError::NotConnected | PlatformError::Timeout
        )
    }
}

/// Lifecycle and message events emitted by a connected client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformEvent {
    /// A fresh authentication challenge (e.g. QR payload) must be shown
    Qr(String),
    /// The challenge was completed
    Authenticated,
    /// The platform rejected the session or the challenge
    AuthenticationFailure(String),
    /// The client is connected and will deliver messages
    Ready,
    /// The underlying transport dropped
    Disconnected(String),
    /// An inbound chat message
    Message(InboundMessage),
    /// New opaque session state that supersedes the current one
    SessionUpdate(Vec<u8>),
}

/// Messaging platform client
///
/// All methods take `&self` and must be safe to call concurrently: the
/// dispatcher issues calls from several sender lanes at once.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Start the client, resuming `session` when given.
    ///
    /// Returns once initialization has been kicked off; progress is reported
    /// through `events` until the client disconnects.
    async fn connect(
        &self,
        session: Option<Session>,
        events: mpsc::Sender<PlatformEvent>,
    ) -> Result<(), PlatformError>;

    /// Send a text message to a conversation
    async fn send_message(&self, target: &str, text: &str) -> Result<MessageRef, PlatformError>;

    /// Forward an existing message to another conversation
    async fn forward_message(&self, message: &MessageRef, target: &str)
    -> Result<(), PlatformError>;

    /// Replace the text of a message previously sent by the bot.
    ///
    /// Default implementation reports the capability as missing, so callers
    /// can fall back to sending a new message.
    async fn edit_message(&self, _message: &MessageRef, _text: &str) -> Result<(), PlatformError> {
        Err(PlatformError::Unsupported("edit_message"))
    }

    /// Resolve the message that `message` replies to
    async fn get_quoted_message(
        &self,
        message: &MessageRef,
    ) -> Result<Option<InboundMessage>, PlatformError>;

    /// Tear the connection down
    async fn disconnect(&self) -> Result<(), PlatformError> {
        Ok(())
    }
}
