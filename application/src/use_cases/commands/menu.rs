use async_trait::async_trait;
use courier_domain::{CommandDescriptor, ParsedCommand};

use crate::use_cases::command_registry::{CommandHandler, HandlerError};
use crate::use_cases::context::CommandContext;

/// Replies with the help text
pub struct MenuCommand;

/// Help text listing `commands` as `<invocation> - <description>` lines
pub fn render_menu<'a>(
    bot_name: &str,
    prefix: char,
    commands: impl Iterator<Item = &'a CommandDescriptor>,
) -> String {
    let mut text = format!("⚡ *{bot_name}* ⚡\nCommands:");
    for command in commands {
        text.push('\n');
        text.push_str(&command.invocation(prefix));
        text.push_str(" - ");
        text.push_str(command.description());
    }
    text
}

#[async_trait]
impl CommandHandler for MenuCommand {
    async fn handle(
        &self,
        ctx: &CommandContext,
        _command: &ParsedCommand,
    ) -> Result<(), HandlerError> {
        let text = render_menu(ctx.bot_name(), ctx.prefix().as_char(), ctx.commands());
        ctx.reply(&text).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingClient, builtin_context, parsed};
    use courier_domain::InboundMessage;
    use std::sync::Arc;

    #[test]
    fn test_render_menu_lists_commands() {
        let ping = CommandDescriptor::new("ping", "Speed test").unwrap();
        let fwd = CommandDescriptor::new("forward", "Forward message")
            .unwrap()
            .with_usage("<jid>");

        let text = render_menu("Bot", '.', [ping, fwd].iter());
        assert_eq!(
            text,
            "⚡ *Bot* ⚡\nCommands:\n.ping - Speed test\n.forward <jid> - Forward message"
        );
    }

    #[tokio::test]
    async fn test_menu_replies_with_all_builtins() {
        let client = Arc::new(RecordingClient::new());
        let ctx = builtin_context(client.clone(), InboundMessage::new("m1", "chat-1", ".menu"));

        MenuCommand.handle(&ctx, &parsed(".menu")).await.unwrap();

        let sends = client.sends();
        assert_eq!(sends.len(), 1);
        let (target, text) = &sends[0];
        assert_eq!(target, "chat-1");
        for line in [
            ".menu - Show menu",
            ".ping - Speed test",
            ".jid - Get chat ID",
            ".forward <jid> - Forward message",
        ] {
            assert!(text.contains(line), "menu missing {line:?}: {text}");
        }
    }
}
