//! Command Dispatcher
//!
//! Turns inbound messages into handler runs.
//!
//! # Dispatch
//!
//! [`CommandDispatcher::dispatch`] parses the text, looks the command up and
//! runs the handler in its own task under the handler timeout. Errors,
//! timeouts and panics are logged with the command name and turned into a
//! generic reply; they never escape the dispatcher.
//!
//! # Ordering
//!
//! [`CommandDispatcher::run`] routes messages into one lane per sender. A
//! lane is a small queue served by a single task, so one sender's messages
//! are handled in arrival order while different senders proceed
//! concurrently. Lanes exit when idle and are recreated on demand.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use courier_domain::InboundMessage;
use courier_domain::util::preview;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::{AbortHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::BotConfig;
use crate::ports::platform_client::PlatformClient;
use crate::use_cases::command_registry::{CommandRegistry, HandlerError};
use crate::use_cases::context::CommandContext;

/// Queued messages per sender before new ones are dropped
const LANE_CAPACITY: usize = 32;

/// Idle time after which a sender lane shuts down
const LANE_IDLE: Duration = Duration::from_secs(60);

/// Aborts the handler task when its dispatch is dropped (timeout or
/// shutdown), so abandoned handlers stop issuing platform calls.
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// What happened to one inbound message
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Not a command; nothing was sent
    Ignored,
    /// Prefixed, but no command of that name is registered
    Unknown(String),
    /// The handler finished successfully
    Handled(String),
    /// The handler failed; the sender got the generic failure reply
    Failed { command: String, error: HandlerError },
}

/// Timeouts and failure policy for dispatching
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub handler_timeout: Duration,
    pub call_timeout: Duration,
    pub shutdown_grace: Duration,
    pub reply_on_failure: bool,
}

impl From<&BotConfig> for DispatchSettings {
    fn from(config: &BotConfig) -> Self {
        Self {
            handler_timeout: config.handler_timeout,
            call_timeout: config.call_timeout,
            shutdown_grace: config.shutdown_grace,
            reply_on_failure: config.reply_on_failure,
        }
    }
}

/// Routes parsed commands to their handlers
pub struct CommandDispatcher {
    registry: Arc<CommandRegistry>,
    client: Arc<dyn PlatformClient>,
    bot_name: Arc<str>,
    settings: DispatchSettings,
}

impl CommandDispatcher {
    pub fn new(
        registry: Arc<CommandRegistry>,
        client: Arc<dyn PlatformClient>,
        config: &BotConfig,
    ) -> Self {
        Self {
            registry,
            client,
            bot_name: Arc::from(config.bot_name.as_str()),
            settings: DispatchSettings::from(config),
        }
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    /// Handle one inbound message.
    ///
    /// Plain chat text and unknown commands produce no platform calls.
    pub async fn dispatch(&self, message: InboundMessage) -> DispatchOutcome {
        let Some(command) = self.registry.parse(&message.raw_text) else {
            return DispatchOutcome::Ignored;
        };

        let Some(registered) = self.registry.lookup(&command.name) else {
            debug!(command = %command.name, sender = %message.sender_id, "Unknown command, ignoring");
            return DispatchOutcome::Unknown(command.name);
        };

        let name = command.name.clone();
        let sender = message.sender_id.clone();
        debug!(
            command = %name,
            sender = %sender,
            text = %preview(&message.raw_text, 80),
            "Dispatching command"
        );

        let ctx = CommandContext::new(
            Arc::clone(&self.client),
            Arc::clone(&self.registry),
            message,
            Arc::clone(&self.bot_name),
            self.settings.call_timeout,
        );
        let handler = registered.handler();

        // Own task so a panicking handler cannot take the lane down.
        let task = tokio::spawn(async move { handler.handle(&ctx, &command).await });
        let _guard = AbortOnDrop(task.abort_handle());

        let result = match tokio::time::timeout(self.settings.handler_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) if join_error.is_panic() => Err(HandlerError::Panicked),
            Ok(Err(join_error)) => Err(HandlerError::Failed(join_error.to_string())),
            Err(_) => Err(HandlerError::Timeout(self.settings.handler_timeout)),
        };

        match result {
            Ok(()) => DispatchOutcome::Handled(name),
            Err(error) => {
                error!(command = %name, sender = %sender, error = %error, "Command failed");
                if self.settings.reply_on_failure {
                    self.send_failure_reply(&sender, &name).await;
                }
                DispatchOutcome::Failed {
                    command: name,
                    error,
                }
            }
        }
    }

    /// Generic, non-leaking failure notice
    async fn send_failure_reply(&self, sender: &str, command: &str) {
        let text = format!(
            "❌ Something went wrong while running {}{command}.",
            self.registry.prefix().as_char()
        );
        let send = self.client.send_message(sender, &text);
        match tokio::time::timeout(self.settings.call_timeout, send).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!(sender = %sender, error = %e, "Could not send failure reply"),
            Err(_) => warn!(sender = %sender, "Failure reply timed out"),
        }
    }

    /// Consume `inbound` until it closes or `shutdown` fires.
    ///
    /// On shutdown, queued and in-flight dispatches get the shutdown grace
    /// period to finish and are aborted afterwards.
    pub async fn run(
        self: Arc<Self>,
        mut inbound: mpsc::Receiver<InboundMessage>,
        shutdown: CancellationToken,
    ) {
        let mut lanes: HashMap<String, mpsc::Sender<InboundMessage>> = HashMap::new();
        let mut workers: JoinSet<String> = JoinSet::new();

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                Some(finished) = workers.join_next(), if !workers.is_empty() => {
                    if let Ok(sender) = finished
                        && lanes.get(&sender).is_some_and(|lane| lane.is_closed())
                    {
                        lanes.remove(&sender);
                    }
                }
                message = inbound.recv() => match message {
                    Some(message) => self.route(&mut lanes, &mut workers, message),
                    None => break,
                },
            }
        }

        // Closing the lanes lets every worker drain its queue and exit.
        drop(lanes);
        let grace = self.settings.shutdown_grace;
        let drained = tokio::time::timeout(grace, async {
            while workers.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            warn!(
                pending = workers.len(),
                "Dispatches still running after {:?}, abandoning", grace
            );
            workers.abort_all();
        }
        info!("Command dispatcher stopped");
    }

    fn route(
        self: &Arc<Self>,
        lanes: &mut HashMap<String, mpsc::Sender<InboundMessage>>,
        workers: &mut JoinSet<String>,
        message: InboundMessage,
    ) {
        let sender = message.sender_id.clone();
        let message = match lanes.get(&sender) {
            Some(lane) => match lane.try_send(message) {
                Ok(()) => return,
                Err(TrySendError::Full(message)) => {
                    warn!(sender = %message.sender_id, "Sender queue full, dropping message");
                    return;
                }
                // The lane went idle and closed; start a fresh one.
                Err(TrySendError::Closed(message)) => message,
            },
            None => message,
        };

        let (tx, rx) = mpsc::channel(LANE_CAPACITY);
        if tx.try_send(message).is_err() {
            return;
        }

        let dispatcher = Arc::clone(self);
        let lane_sender = sender.clone();
        workers.spawn(async move {
            dispatcher.serve_lane(rx).await;
            lane_sender
        });
        lanes.insert(sender, tx);
    }

    async fn serve_lane(&self, mut rx: mpsc::Receiver<InboundMessage>) {
        loop {
            match tokio::time::timeout(LANE_IDLE, rx.recv()).await {
                Ok(Some(message)) => {
                    self.dispatch(message).await;
                }
                Ok(None) => return,
                Err(_) => break,
            }
        }

        // Idle: refuse new messages, then finish whatever slipped in.
        rx.close();
        while let Some(message) = rx.recv().await {
            self.dispatch(message).await;
        }
    }
}
