//! Running bot: supervisor event loop plus command dispatcher
//!
//! [`BotRuntime::stop`] drains the dispatcher before the platform client is
//! disconnected, so replies of in-flight commands still reach the platform
//! during the shutdown grace period.

use std::sync::Arc;

use courier_domain::InboundMessage;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::use_cases::connection_supervisor::{ConnectionSupervisor, SupervisorError};
use crate::use_cases::dispatcher::CommandDispatcher;

/// Handles to the background tasks of a started bot
pub struct BotRuntime {
    supervisor: Arc<ConnectionSupervisor>,
    supervisor_task: JoinHandle<Result<(), SupervisorError>>,
    dispatcher_task: JoinHandle<()>,
    shutdown: CancellationToken,
}

impl BotRuntime {
    /// Spawn the supervisor event loop and the dispatcher, connected by a
    /// channel of `inbound_buffer` messages.
    ///
    /// The dispatcher stops when `shutdown` is cancelled.
    pub fn start(
        supervisor: Arc<ConnectionSupervisor>,
        dispatcher: Arc<CommandDispatcher>,
        inbound_buffer: usize,
        shutdown: CancellationToken,
    ) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel::<InboundMessage>(inbound_buffer);
        let supervisor_task = tokio::spawn(Arc::clone(&supervisor).run(inbound_tx));
        let dispatcher_task = tokio::spawn(dispatcher.run(inbound_rx, shutdown.child_token()));

        Self {
            supervisor,
            supervisor_task,
            dispatcher_task,
            shutdown,
        }
    }

    pub fn supervisor(&self) -> &Arc<ConnectionSupervisor> {
        &self.supervisor
    }

    /// Stop in dependency order: drain dispatches (bounded by the shutdown
    /// grace), then disconnect the platform client.
    pub async fn stop(self) {
        self.shutdown.cancel();
        if let Err(e) = self.dispatcher_task.await {
            warn!(error = %e, "Dispatcher task ended abnormally");
        }

        self.supervisor.shutdown().await;
        self.supervisor_task.abort();
        debug!("Bot runtime stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BotConfig;
    use crate::ports::auth_presenter::AuthChallengePresenter;
    use crate::ports::platform_client::PlatformEvent;
    use crate::testing::{ConnectScript, MemoryStore, PlatformCall, RecordingClient};
    use crate::use_cases::command_registry::{CommandHandler, CommandRegistry, HandlerError};
    use crate::use_cases::connection_supervisor::SupervisorSettings;
    use crate::use_cases::context::CommandContext;
    use async_trait::async_trait;
    use courier_domain::{CommandDescriptor, ConnectionState, ParsedCommand, SessionId};
    use std::time::Duration;

    struct Silent;

    impl AuthChallengePresenter for Silent {
        fn present(&self, _challenge: &str) {}
    }

    struct SlowReply(Duration);

    #[async_trait]
    impl CommandHandler for SlowReply {
        async fn handle(
            &self,
            ctx: &CommandContext,
            _command: &ParsedCommand,
        ) -> Result<(), HandlerError> {
            tokio::time::sleep(self.0).await;
            ctx.reply("done").await?;
            Ok(())
        }
    }

    fn start(client: Arc<RecordingClient>, config: &BotConfig, handler: SlowReply) -> BotRuntime {
        let shutdown = CancellationToken::new();
        let supervisor = Arc::new(
            ConnectionSupervisor::new(
                client.clone(),
                Arc::new(MemoryStore::new("test")),
                Arc::new(Silent),
                SupervisorSettings::from(config),
            )
            .with_cancellation(shutdown.child_token()),
        );

        let mut registry = CommandRegistry::new(config.prefix);
        registry
            .register(CommandDescriptor::new("slow", "test").unwrap(), handler)
            .unwrap();
        let dispatcher = Arc::new(CommandDispatcher::new(Arc::new(registry), client, config));

        BotRuntime::start(supervisor, dispatcher, 8, shutdown)
    }

    async fn ready_with_message(client: &RecordingClient, runtime: &BotRuntime) {
        client.push_script(ConnectScript::ok(vec![
            PlatformEvent::Ready,
            PlatformEvent::Message(InboundMessage::new("m1", "chat-1", ".slow")),
        ]));
        runtime.supervisor().initialize().await;
        let mut state = runtime.supervisor().subscribe();
        state
            .wait_for(|s| *s == ConnectionState::Ready)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_delivers_in_flight_reply_before_disconnect() {
        let client = Arc::new(RecordingClient::new());
        let config = BotConfig::new(SessionId::parse("test").unwrap());
        let runtime = start(
            client.clone(),
            &config,
            SlowReply(Duration::from_millis(300)),
        );
        ready_with_message(&client, &runtime).await;

        runtime.stop().await;

        let calls = client.calls();
        let reply = calls
            .iter()
            .position(|c| matches!(c, PlatformCall::Send { text, .. } if text == "done"))
            .expect("in-flight reply was delivered");
        let disconnect = calls
            .iter()
            .position(|c| *c == PlatformCall::Disconnect)
            .expect("client disconnected");
        assert!(reply < disconnect);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_abandons_dispatch_after_grace() {
        let client = Arc::new(RecordingClient::new());
        let mut config = BotConfig::new(SessionId::parse("test").unwrap());
        config.shutdown_grace = Duration::from_secs(1);
        config.handler_timeout = Duration::from_secs(600);
        let runtime = start(client.clone(), &config, SlowReply(Duration::from_secs(120)));
        ready_with_message(&client, &runtime).await;

        let started = tokio::time::Instant::now();
        runtime.stop().await;

        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(client.sends().is_empty());
        assert_eq!(client.calls().last(), Some(&PlatformCall::Disconnect));
    }
}
