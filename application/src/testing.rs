//! In-memory port doubles shared by the use case tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use courier_domain::{
    InboundMessage, MessageRef, PersistenceMode, Session, SessionId, SessionStore,
    SessionStoreError,
};
use tokio::sync::{Notify, mpsc};
use tokio::time::Instant;

use crate::ports::platform_client::{PlatformClient, PlatformError, PlatformEvent};

/// One call observed by [`RecordingClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    Connect { session: Option<Vec<u8>> },
    Send { target: String, text: String },
    Forward { message: MessageRef, target: String },
    Edit { message: MessageRef, text: String },
    GetQuoted { message: MessageRef },
    Disconnect,
}

/// Scripted outcome for one `connect` call
pub struct ConnectScript {
    pub result: Result<(), PlatformError>,
    pub events: Vec<PlatformEvent>,
}

impl ConnectScript {
    pub fn ok(events: Vec<PlatformEvent>) -> Self {
        Self {
            result: Ok(()),
            events,
        }
    }

    pub fn fail(reason: &str) -> Self {
        Self {
            result: Err(PlatformError::Transport(reason.to_string())),
            events: Vec::new(),
        }
    }
}

/// Platform client that records every call
#[derive(Default)]
pub struct RecordingClient {
    calls: Mutex<Vec<PlatformCall>>,
    connect_times: Mutex<Vec<Instant>>,
    scripts: Mutex<VecDeque<ConnectScript>>,
    /// Fallback when the script queue is empty
    fail_connect: AtomicBool,
    edit_unsupported: AtomicBool,
    fail_sends: AtomicBool,
    quoted: Mutex<HashMap<MessageRef, InboundMessage>>,
    send_delays: Mutex<HashMap<String, Duration>>,
    connect_gate: Mutex<Option<std::sync::Arc<Notify>>>,
    next_id: AtomicUsize,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_edit(self) -> Self {
        self.edit_unsupported.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_sends(self) -> Self {
        self.fail_sends.store(true, Ordering::SeqCst);
        self
    }

    pub fn always_failing_connect(self) -> Self {
        self.fail_connect.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_quoted(self, reply: &MessageRef, quoted: InboundMessage) -> Self {
        self.quoted.lock().unwrap().insert(reply.clone(), quoted);
        self
    }

    pub fn with_send_delay(self, target: &str, delay: Duration) -> Self {
        self.send_delays
            .lock()
            .unwrap()
            .insert(target.to_string(), delay);
        self
    }

    /// Block `connect` until the returned notify fires
    pub fn gate_connect(&self) -> std::sync::Arc<Notify> {
        let gate = std::sync::Arc::new(Notify::new());
        *self.connect_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn push_script(&self, script: ConnectScript) {
        self.scripts.lock().unwrap().push_back(script);
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn connect_times(&self) -> Vec<Instant> {
        self.connect_times.lock().unwrap().clone()
    }

    pub fn connect_count(&self) -> usize {
        self.connect_times.lock().unwrap().len()
    }

    pub fn sends(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                PlatformCall::Send { target, text } => Some((target, text)),
                _ => None,
            })
            .collect()
    }

    pub fn forwards(&self) -> Vec<(MessageRef, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                PlatformCall::Forward { message, target } => Some((message, target)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: PlatformCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PlatformClient for RecordingClient {
    async fn connect(
        &self,
        session: Option<Session>,
        events: mpsc::Sender<PlatformEvent>,
    ) -> Result<(), PlatformError> {
        self.record(PlatformCall::Connect {
            session: session.map(|s| s.payload().to_vec()),
        });
        self.connect_times.lock().unwrap().push(Instant::now());

        let gate = self.connect_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let script = self.scripts.lock().unwrap().pop_front();
        match script {
            Some(script) => {
                for event in script.events {
                    let _ = events.send(event).await;
                }
                script.result
            }
            None if self.fail_connect.load(Ordering::SeqCst) => {
                Err(PlatformError::Transport("connection refused".to_string()))
            }
            None => Ok(()),
        }
    }

    async fn send_message(&self, target: &str, text: &str) -> Result<MessageRef, PlatformError> {
        let delay = self.send_delays.lock().unwrap().get(target).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.record(PlatformCall::Send {
            target: target.to_string(),
            text: text.to_string(),
        });
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(PlatformError::Transport("send failed".to_string()));
        }
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(MessageRef::new(format!("sent-{n}")))
    }

    async fn forward_message(
        &self,
        message: &MessageRef,
        target: &str,
    ) -> Result<(), PlatformError> {
        self.record(PlatformCall::Forward {
            message: message.clone(),
            target: target.to_string(),
        });
        Ok(())
    }

    async fn edit_message(&self, message: &MessageRef, text: &str) -> Result<(), PlatformError> {
        self.record(PlatformCall::Edit {
            message: message.clone(),
            text: text.to_string(),
        });
        if self.edit_unsupported.load(Ordering::SeqCst) {
            return Err(PlatformError::Unsupported("edit_message"));
        }
        Ok(())
    }

    async fn get_quoted_message(
        &self,
        message: &MessageRef,
    ) -> Result<Option<InboundMessage>, PlatformError> {
        self.record(PlatformCall::GetQuoted {
            message: message.clone(),
        });
        Ok(self.quoted.lock().unwrap().get(message).cloned())
    }

    async fn disconnect(&self) -> Result<(), PlatformError> {
        self.record(PlatformCall::Disconnect);
        Ok(())
    }
}

/// Session store holding a single session in memory
pub struct MemoryStore {
    id: SessionId,
    session: Mutex<Option<Session>>,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
    deletes: AtomicUsize,
}

impl MemoryStore {
    pub fn new(id: &str) -> Self {
        Self {
            id: SessionId::parse(id).unwrap(),
            session: Mutex::new(None),
            fail_saves: AtomicBool::new(false),
            saves: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
        }
    }

    pub fn with_session(self, payload: &[u8]) -> Self {
        *self.session.lock().unwrap() = Some(Session::new(self.id.clone(), payload.to_vec()));
        self
    }

    pub fn failing_saves(self) -> Self {
        self.fail_saves.store(true, Ordering::SeqCst);
        self
    }

    pub fn stored(&self) -> Option<Session> {
        self.session.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    fn session_id(&self) -> &SessionId {
        &self.id
    }

    fn persistence(&self) -> PersistenceMode {
        PersistenceMode::Durable
    }

    async fn load(&self) -> Option<Session> {
        self.stored()
    }

    async fn save(&self, session: &Session) -> Result<(), SessionStoreError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(SessionStoreError::Io(std::io::Error::other("disk full")));
        }
        *self.session.lock().unwrap() = Some(session.clone());
        Ok(())
    }

    async fn delete(&self, _id: &SessionId) -> Result<(), SessionStoreError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        *self.session.lock().unwrap() = None;
        Ok(())
    }
}

/// Context for `message` backed by the built-in registry and default config
pub fn builtin_context(
    client: std::sync::Arc<RecordingClient>,
    message: InboundMessage,
) -> crate::use_cases::context::CommandContext {
    let config = crate::config::BotConfig::new(SessionId::parse("test").unwrap());
    let registry = crate::use_cases::command_registry::CommandRegistry::with_builtins(&config)
        .unwrap();
    crate::use_cases::context::CommandContext::new(
        client,
        std::sync::Arc::new(registry),
        message,
        std::sync::Arc::from("Courier Bot"),
        config.call_timeout,
    )
}

/// Parse `text` with the default prefix, panicking when it is not a command
pub fn parsed(text: &str) -> courier_domain::ParsedCommand {
    courier_domain::parse_command(text, courier_domain::CommandPrefix::DEFAULT)
        .unwrap_or_else(|| panic!("{text:?} is not a command"))
}
