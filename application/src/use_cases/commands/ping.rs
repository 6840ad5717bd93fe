use async_trait::async_trait;
use courier_domain::ParsedCommand;
use tokio::time::Instant;

use crate::ports::platform_client::PlatformError;
use crate::use_cases::command_registry::{CommandHandler, HandlerError};
use crate::use_cases::context::CommandContext;

/// Measures how long the platform takes to acknowledge a reply.
///
/// The elapsed time is edited into the provisional reply; platforms that
/// cannot edit get a second message instead.
pub struct PingCommand;

#[async_trait]
impl CommandHandler for PingCommand {
    async fn handle(
        &self,
        ctx: &CommandContext,
        _command: &ParsedCommand,
    ) -> Result<(), HandlerError> {
        let started = Instant::now();
        let provisional = ctx.reply("🏓 Testing...").await?;
        let elapsed_ms = started.elapsed().as_millis();

        let text = format!("🏓 Pong! {elapsed_ms}ms");
        match ctx.edit(&provisional, &text).await {
            Ok(()) => Ok(()),
            Err(PlatformError::Unsupported(_)) => {
                tracing::debug!("Platform cannot edit messages, sending ping result separately");
                ctx.reply(&text).await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
