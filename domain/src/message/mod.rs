//! Inbound message value objects

use serde::{Deserialize, Serialize};
use std::fmt;

/// Platform-assigned reference to a message, used to edit, forward or
/// resolve quotes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef(String);

impl MessageRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A message delivered by the platform
///
/// `sender_id` is the conversation identifier replies are sent to.
/// Exists only for the duration of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub id: MessageRef,
    pub sender_id: String,
    pub raw_text: String,
    /// The message this one replies to, if any
    pub quoted: Option<MessageRef>,
}

impl InboundMessage {
    pub fn new(
        id: impl Into<String>,
        sender_id: impl Into<String>,
        raw_text: impl Into<String>,
    ) -> Self {
        Self {
            id: MessageRef::new(id),
            sender_id: sender_id.into(),
            raw_text: raw_text.into(),
            quoted: None,
        }
    }

    pub fn replying_to(mut self, quoted: MessageRef) -> Self {
        self.quoted = Some(quoted);
        self
    }

    pub fn is_reply(&self) -> bool {
        self.quoted.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replying_to_sets_quote() {
        let msg = InboundMessage::new("m1", "chat@1", "hello");
        assert!(!msg.is_reply());
        let reply = msg.replying_to(MessageRef::new("m0"));
        assert_eq!(reply.quoted, Some(MessageRef::new("m0")));
        assert!(reply.is_reply());
    }
}
