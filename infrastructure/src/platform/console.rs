//! Console platform client
//!
//! A stand-in messaging platform on stdin/stdout, so the bot runs end to end
//! without a real SDK. Each input line is an inbound message from a single
//! chat; outgoing messages are printed.
//!
//! | Input           | Effect                                          |
//! |-----------------|-------------------------------------------------|
//! | `<text>`        | inbound message                                 |
//! | `/quote <text>` | inbound message replying to the previous one    |
//! | `/drop`         | simulated transport drop                        |
//!
//! Without a session the client first emits a challenge, then completes it
//! after `auth_delay` and issues a session the next start can resume.
//!
//! A single reader task owns the input for the client's lifetime and feeds
//! whichever event channel the latest `connect` supplied.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use courier_application::ports::platform_client::{PlatformClient, PlatformError, PlatformEvent};
use courier_domain::{InboundMessage, MessageRef, Session};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const SESSION_MARKER: &str = "console-session:";

/// Inbound messages remembered for quote resolution and forwarding
const HISTORY_LIMIT: usize = 512;

type Input = Box<dyn AsyncBufRead + Send + Unpin>;
type Output = Box<dyn AsyncWrite + Send + Unpin>;

/// Recently seen inbound messages, oldest evicted first
#[derive(Default)]
struct History {
    messages: HashMap<MessageRef, InboundMessage>,
    order: VecDeque<MessageRef>,
}

impl History {
    fn remember(&mut self, message: InboundMessage) {
        if self.order.len() == HISTORY_LIMIT
            && let Some(oldest) = self.order.pop_front()
        {
            self.messages.remove(&oldest);
        }
        self.order.push_back(message.id.clone());
        self.messages.insert(message.id.clone(), message);
    }

    fn get(&self, id: &MessageRef) -> Option<&InboundMessage> {
        self.messages.get(id)
    }

    fn last(&self) -> Option<&MessageRef> {
        self.order.back()
    }
}

/// State shared with the reader task
struct Shared {
    chat_id: String,
    events: Mutex<Option<mpsc::Sender<PlatformEvent>>>,
    history: Mutex<History>,
    connected: AtomicBool,
    next_inbound: AtomicU64,
}

impl Shared {
    fn sender(&self) -> Option<mpsc::Sender<PlatformEvent>> {
        lock(&self.events).clone()
    }

    async fn emit(&self, event: PlatformEvent) {
        let Some(sender) = self.sender() else {
            debug!("No event channel, dropping console event");
            return;
        };
        if sender.send(event).await.is_err() {
            debug!("Event channel closed, dropping console event");
        }
    }

    async fn handle_line(&self, line: &str) {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return;
        }

        if line.trim() == "/drop" {
            info!("Simulating transport drop");
            self.connected.store(false, Ordering::SeqCst);
            self.emit(PlatformEvent::Disconnected("simulated transport drop".to_string()))
                .await;
            return;
        }

        let id = format!("in-{}", self.next_inbound.fetch_add(1, Ordering::SeqCst));
        let message = match line.strip_prefix("/quote ") {
            Some(text) => {
                let previous = lock(&self.history).last().cloned();
                let message = InboundMessage::new(id, self.chat_id.as_str(), text);
                match previous {
                    Some(previous) => message.replying_to(previous),
                    None => message,
                }
            }
            None => InboundMessage::new(id, self.chat_id.as_str(), line),
        };

        lock(&self.history).remember(message.clone());
        self.emit(PlatformEvent::Message(message)).await;
    }
}

pub struct ConsolePlatformClient {
    shared: Arc<Shared>,
    input: Mutex<Option<Input>>,
    output: Arc<tokio::sync::Mutex<Output>>,
    next_outbound: AtomicU64,
    next_session: AtomicU64,
    auth_delay: Duration,
    shutdown: CancellationToken,
}

impl ConsolePlatformClient {
    pub const DEFAULT_CHAT_ID: &'static str = "console@local";
    pub const DEFAULT_AUTH_DELAY: Duration = Duration::from_secs(2);

    /// Client on the process's stdin and stdout
    pub fn stdio() -> Self {
        Self::with_io(
            Self::DEFAULT_CHAT_ID,
            BufReader::new(tokio::io::stdin()),
            tokio::io::stdout(),
        )
    }

    pub fn with_io(
        chat_id: &str,
        input: impl AsyncBufRead + Send + Unpin + 'static,
        output: impl AsyncWrite + Send + Unpin + 'static,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                chat_id: chat_id.to_string(),
                events: Mutex::new(None),
                history: Mutex::new(History::default()),
                connected: AtomicBool::new(false),
                next_inbound: AtomicU64::new(1),
            }),
            input: Mutex::new(Some(Box::new(input))),
            output: Arc::new(tokio::sync::Mutex::new(Box::new(output))),
            next_outbound: AtomicU64::new(1),
            next_session: AtomicU64::new(1),
            auth_delay: Self::DEFAULT_AUTH_DELAY,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_auth_delay(mut self, delay: Duration) -> Self {
        self.auth_delay = delay;
        self
    }

    /// Start the reader task the first time a connection is made
    fn start_reader(&self) {
        let Some(mut input) = lock(&self.input).take() else {
            return;
        };
        let shared = Arc::clone(&self.shared);
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            let mut line = String::new();
            loop {
                line.clear();
                let read = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    read = input.read_line(&mut line) => read,
                };
                match read {
                    Ok(0) => {
                        debug!("Console input closed");
                        break;
                    }
                    Ok(_) => shared.handle_line(&line).await,
                    Err(e) => {
                        warn!(error = %e, "Failed to read console input");
                        break;
                    }
                }
            }
        });
    }

    async fn print(&self, line: &str) -> Result<(), PlatformError> {
        let mut output = self.output.lock().await;
        let write = async {
            output.write_all(line.as_bytes()).await?;
            output.write_all(b"\n").await?;
            output.flush().await
        };
        write
            .await
            .map_err(|e| PlatformError::Transport(format!("console write failed: {e}")))
    }

    fn ensure_connected(&self) -> Result<(), PlatformError> {
        if self.shared.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(PlatformError::NotConnected)
        }
    }
}

#[async_trait]
impl PlatformClient for ConsolePlatformClient {
    async fn connect(
        &self,
        session: Option<Session>,
        events: mpsc::Sender<PlatformEvent>,
    ) -> Result<(), PlatformError> {
        if self.shutdown.is_cancelled() {
            return Err(PlatformError::NotConnected);
        }
        *lock(&self.shared.events) = Some(events);
        self.start_reader();

        let shared = Arc::clone(&self.shared);
        match session {
            Some(session) if session.payload().starts_with(SESSION_MARKER.as_bytes()) => {
                debug!(session = %session.id(), "Resuming console session");
                shared.connected.store(true, Ordering::SeqCst);
                shared.emit(PlatformEvent::Ready).await;
            }
            Some(_) => {
                shared
                    .emit(PlatformEvent::AuthenticationFailure(
                        "session was not issued by the console platform".to_string(),
                    ))
                    .await;
            }
            None => {
                let n = self.next_session.fetch_add(1, Ordering::SeqCst);
                let challenge = format!("courier-console:{}:{n}", shared.chat_id);
                let payload = format!("{SESSION_MARKER}{}:{n}", shared.chat_id).into_bytes();
                let delay = self.auth_delay;
                let shutdown = self.shutdown.clone();

                shared.emit(PlatformEvent::Qr(challenge)).await;
                tokio::spawn(async move {
                    tokio::select! {
                        _ = shutdown.cancelled() => return,
                        _ = tokio::time::sleep(delay) => {}
                    }
                    shared.emit(PlatformEvent::Authenticated).await;
                    shared.emit(PlatformEvent::SessionUpdate(payload)).await;
                    shared.connected.store(true, Ordering::SeqCst);
                    shared.emit(PlatformEvent::Ready).await;
                });
            }
        }
        Ok(())
    }

    async fn send_message(&self, target: &str, text: &str) -> Result<MessageRef, PlatformError> {
        self.ensure_connected()?;
        let id = MessageRef::new(format!(
            "out-{}",
            self.next_outbound.fetch_add(1, Ordering::SeqCst)
        ));
        self.print(&format!("[{target}] {text}")).await?;
        Ok(id)
    }

    async fn forward_message(
        &self,
        message: &MessageRef,
        target: &str,
    ) -> Result<(), PlatformError> {
        self.ensure_connected()?;
        let text = lock(&self.shared.history)
            .get(message)
            .map(|m| m.raw_text.clone())
            .ok_or_else(|| PlatformError::MessageNotFound(message.to_string()))?;
        self.print(&format!("[{target}] (forwarded) {text}")).await
    }

    async fn edit_message(&self, message: &MessageRef, text: &str) -> Result<(), PlatformError> {
        self.ensure_connected()?;
        self.print(&format!("[edit {message}] {text}")).await
    }

    async fn get_quoted_message(
        &self,
        message: &MessageRef,
    ) -> Result<Option<InboundMessage>, PlatformError> {
        let history = lock(&self.shared.history);
        Ok(history
            .get(message)
            .and_then(|m| m.quoted.as_ref())
            .and_then(|quoted| history.get(quoted))
            .cloned())
    }

    async fn disconnect(&self) -> Result<(), PlatformError> {
        self.shutdown.cancel();
        self.shared.connected.store(false, Ordering::SeqCst);
        *lock(&self.shared.events) = None;
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
