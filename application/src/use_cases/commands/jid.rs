use async_trait::async_trait;
use courier_domain::ParsedCommand;

use crate::use_cases::command_registry::{CommandHandler, HandlerError};
use crate::use_cases::context::CommandContext;

/// Replies with the conversation identifier, verbatim
pub struct JidCommand;

#[async_trait]
impl CommandHandler for JidCommand {
    async fn handle(
        &self,
        ctx: &CommandContext,
        _command: &ParsedCommand,
    ) -> Result<(), HandlerError> {
        ctx.reply(&format!("📱 Chat JID: {}", ctx.sender_id()))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingClient, builtin_context, parsed};
    use courier_domain::InboundMessage;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_jid_echoes_sender() {
        let client = Arc::new(RecordingClient::new());
        let ctx = builtin_context(
            client.clone(),
            InboundMessage::new("m1", "120363@g.us", ".jid"),
        );

        JidCommand.handle(&ctx, &parsed(".jid")).await.unwrap();

        assert_eq!(
            client.sends(),
            vec![("120363@g.us".to_string(), "📱 Chat JID: 120363@g.us".to_string())]
        );
    }
}
