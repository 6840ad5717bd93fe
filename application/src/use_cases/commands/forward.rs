use async_trait::async_trait;
use courier_domain::ParsedCommand;

use crate::use_cases::command_registry::{CommandHandler, HandlerError};
use crate::use_cases::context::CommandContext;

const FORWARDED: &str = "✅ Message forwarded!";

/// The single target argument, or `None` when there are zero or several
fn single_target(command: &ParsedCommand) -> Option<&str> {
    match command.arg_list().as_slice() {
        [target] => Some(*target),
        _ => None,
    }
}

fn usage(ctx: &CommandContext) -> String {
    format!(
        "❌ Please provide JID: {}forward <jid>",
        ctx.prefix().as_char()
    )
}

/// `forward <jid>`: forwards the command message itself
pub struct ForwardCurrentCommand;

#[async_trait]
impl CommandHandler for ForwardCurrentCommand {
    async fn handle(
        &self,
        ctx: &CommandContext,
        command: &ParsedCommand,
    ) -> Result<(), HandlerError> {
        let Some(target) = single_target(command) else {
            ctx.reply(&usage(ctx)).await?;
            return Ok(());
        };

        ctx.forward(target).await?;
        tracing::info!(target = %target, sender = %ctx.sender_id(), "Forwarded message");
        ctx.reply(FORWARDED).await?;
        Ok(())
    }
}

/// `forward <jid>` sent as a reply: forwards the quoted message
pub struct ForwardQuotedCommand;

#[async_trait]
impl CommandHandler for ForwardQuotedCommand {
    async fn handle(
        &self,
        ctx: &CommandContext,
        command: &ParsedCommand,
    ) -> Result<(), HandlerError> {
        if !ctx.message().is_reply() {
            ctx.reply(&format!(
                "❌ Reply to the message you want to forward, then send {}forward <jid>",
                ctx.prefix().as_char()
            ))
            .await?;
            return Ok(());
        }

        let Some(target) = single_target(command) else {
            ctx.reply(&usage(ctx)).await?;
            return Ok(());
        };

        let Some(quoted) = ctx.quoted().await? else {
            ctx.reply("❌ The quoted message is no longer available")
                .await?;
            return Ok(());
        };

        ctx.forward_message(&quoted.id, target).await?;
        tracing::info!(target = %target, sender = %ctx.sender_id(), "Forwarded quoted message");
        ctx.reply(FORWARDED).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{PlatformCall, RecordingClient, builtin_context, parsed};
    use courier_domain::{InboundMessage, MessageRef};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_forward_without_target_replies_usage() {
        let client = Arc::new(RecordingClient::new());
        let ctx = builtin_context(client.clone(), InboundMessage::new("m1", "chat-1", ".forward"));

        ForwardCurrentCommand
            .handle(&ctx, &parsed(".forward"))
            .await
            .unwrap();

        assert!(client.forwards().is_empty());
        assert_eq!(
            client.sends(),
            vec![(
                "chat-1".to_string(),
                "❌ Please provide JID: .forward <jid>".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_forward_with_two_targets_replies_usage() {
        let client = Arc::new(RecordingClient::new());
        let ctx = builtin_context(
            client.clone(),
            InboundMessage::new("m1", "chat-1", ".forward a b"),
        );

        ForwardCurrentCommand
            .handle(&ctx, &parsed(".forward a b"))
            .await
            .unwrap();

        assert!(client.forwards().is_empty());
    }

    #[tokio::test]
    async fn test_forward_current_message_to_target() {
        let client = Arc::new(RecordingClient::new());
        let ctx = builtin_context(
            client.clone(),
            InboundMessage::new("m1", "chat-1", ".forward abc123"),
        );

        ForwardCurrentCommand
            .handle(&ctx, &parsed(".forward abc123"))
            .await
            .unwrap();

        assert_eq!(
            client.calls(),
            vec![
                PlatformCall::Forward {
                    message: MessageRef::new("m1"),
                    target: "abc123".to_string()
                },
                PlatformCall::Send {
                    target: "chat-1".to_string(),
                    text: FORWARDED.to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_quoted_variant_requires_quote() {
        let client = Arc::new(RecordingClient::new());
        let ctx = builtin_context(
            client.clone(),
            InboundMessage::new("m1", "chat-1", ".forward abc123"),
        );

        ForwardQuotedCommand
            .handle(&ctx, &parsed(".forward abc123"))
            .await
            .unwrap();

        assert!(client.forwards().is_empty());
        let sends = client.sends();
        assert_eq!(sends.len(), 1);
        assert!(sends[0].1.contains("Reply to the message"));
    }

    #[tokio::test]
    async fn test_quoted_variant_forwards_quoted_message() {
        let reply = InboundMessage::new("m2", "chat-1", ".forward abc123")
            .replying_to(MessageRef::new("m1"));
        let original = InboundMessage::new("m1", "chat-1", "look at this");
        let client = Arc::new(RecordingClient::new().with_quoted(&reply.id, original));
        let ctx = builtin_context(client.clone(), reply);

        ForwardQuotedCommand
            .handle(&ctx, &parsed(".forward abc123"))
            .await
            .unwrap();

        assert_eq!(
            client.forwards(),
            vec![(MessageRef::new("m1"), "abc123".to_string())]
        );
        assert_eq!(client.sends().last().unwrap().1, FORWARDED);
    }

    #[tokio::test]
    async fn test_quoted_variant_without_target_replies_usage() {
        let reply =
            InboundMessage::new("m2", "chat-1", ".forward").replying_to(MessageRef::new("m1"));
        let client = Arc::new(RecordingClient::new());
        let ctx = builtin_context(client.clone(), reply);

        ForwardQuotedCommand
            .handle(&ctx, &parsed(".forward"))
            .await
            .unwrap();

        assert!(client.forwards().is_empty());
        assert_eq!(client.sends()[0].1, "❌ Please provide JID: .forward <jid>");
    }
}
