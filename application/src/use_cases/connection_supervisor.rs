//! Connection Supervisor
//!
//! Owns the platform client's lifecycle and the [`ConnectionState`] machine.
//!
//! # Responsibilities
//!
//! - Resume the stored session when there is one, otherwise surface the
//!   authentication challenge through [`AuthChallengePresenter`]
//! - Persist every session update (fire-and-forget, never blocks messages)
//! - Re-initialize after transport drops and rejections, backing off per
//!   [`RetryPolicy`]; give up with [`ConnectionState::Failed`] once the
//!   budget is spent
//! - Forward inbound messages to the dispatcher only while `Ready`
//!
//! # Concurrency
//!
//! Only one initialization attempt runs at a time: a concurrent
//! [`initialize`](ConnectionSupervisor::initialize) returns
//! [`InitializeOutcome::AlreadyInFlight`]. Retries run on timer tasks that
//! are cancelled with the supervisor's [`CancellationToken`].

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use courier_domain::{
    ConnectionState, InboundMessage, PersistenceMode, RetryDecision, RetryPolicy, Session,
    SessionStore,
};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::BotConfig;
use crate::ports::auth_presenter::AuthChallengePresenter;
use crate::ports::platform_client::{PlatformClient, PlatformError, PlatformEvent};
use crate::use_cases::status::StatusBoard;

const EVENT_BUFFER: usize = 64;

/// Errors from the supervisor itself (not from the platform)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SupervisorError {
    #[error("Supervisor event loop is already running")]
    AlreadyRunning,
}

/// Result of an [`initialize`](ConnectionSupervisor::initialize) call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitializeOutcome {
    /// The client accepted the connection request
    Started,
    /// Another attempt is still running; nothing was done
    AlreadyInFlight,
    /// The client is already connected
    AlreadyReady,
    /// Shut down or permanently failed; nothing was done
    Stopped,
    /// The client refused to start; a retry may have been scheduled
    Failed(PlatformError),
}

/// Why the supervisor stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorExit {
    /// Retries exhausted; an operator has to intervene
    Failed,
    /// Graceful shutdown was requested
    ShutDown,
}

/// Timing knobs taken from [`BotConfig`]
#[derive(Debug, Clone)]
pub struct SupervisorSettings {
    pub retry: RetryPolicy,
    pub connect_timeout: Duration,
    pub store_timeout: Duration,
    pub call_timeout: Duration,
}

impl From<&BotConfig> for SupervisorSettings {
    fn from(config: &BotConfig) -> Self {
        Self {
            retry: config.retry,
            connect_timeout: config.connect_timeout,
            store_timeout: config.store_timeout,
            call_timeout: config.call_timeout,
        }
    }
}

/// In-memory view of the session
enum SessionSlot {
    /// The store has not been consulted yet
    Unloaded,
    /// No usable session; the next connect needs a fresh challenge
    Absent,
    Present(Session),
}

pub struct ConnectionSupervisor {
    client: Arc<dyn PlatformClient>,
    store: Arc<dyn SessionStore>,
    presenter: Arc<dyn AuthChallengePresenter>,
    settings: SupervisorSettings,
    state: watch::Sender<ConnectionState>,
    session: Mutex<SessionSlot>,
    session_present: Arc<AtomicBool>,
    in_flight: AtomicBool,
    /// Consecutive failures since the last `Ready`
    failures: AtomicU32,
    /// Bumped on each session update; saves of older generations are skipped
    generation: AtomicU64,
    last_saved: Arc<tokio::sync::Mutex<u64>>,
    events_tx: mpsc::Sender<PlatformEvent>,
    events_rx: Mutex<Option<mpsc::Receiver<PlatformEvent>>>,
    shutdown: CancellationToken,
}

impl ConnectionSupervisor {
    pub fn new(
        client: Arc<dyn PlatformClient>,
        store: Arc<dyn SessionStore>,
        presenter: Arc<dyn AuthChallengePresenter>,
        settings: SupervisorSettings,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let (state, _) = watch::channel(ConnectionState::Initializing);

        Self {
            client,
            store,
            presenter,
            settings,
            state,
            session: Mutex::new(SessionSlot::Unloaded),
            session_present: Arc::new(AtomicBool::new(false)),
            in_flight: AtomicBool::new(false),
            failures: AtomicU32::new(0),
            generation: AtomicU64::new(0),
            last_saved: Arc::new(tokio::sync::Mutex::new(0)),
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
            shutdown: CancellationToken::new(),
        }
    }

    /// Tie the supervisor's lifetime to an outer cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Read-only status view for the health surface
    pub fn status_board(&self, bot_name: &str) -> StatusBoard {
        StatusBoard::new(
            bot_name,
            self.state.subscribe(),
            Arc::clone(&self.session_present),
        )
    }

    /// Start (or restart) the platform client.
    pub async fn initialize(self: &Arc<Self>) -> InitializeOutcome {
        if self.shutdown.is_cancelled() || self.state().is_terminal() {
            return InitializeOutcome::Stopped;
        }
        if self.state() == ConnectionState::Ready {
            return InitializeOutcome::AlreadyReady;
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Initialization already in flight, ignoring");
            return InitializeOutcome::AlreadyInFlight;
        }

        self.transition(ConnectionState::Initializing);
        let session = self.current_session().await;
        info!(resuming = session.is_some(), "Initializing platform client");

        let connect = self.client.connect(session, self.events_tx.clone());
        let result = tokio::time::timeout(self.settings.connect_timeout, connect)
            .await
            .unwrap_or(Err(PlatformError::Timeout));
        self.in_flight.store(false, Ordering::SeqCst);

        match result {
            Ok(()) => InitializeOutcome::Started,
            Err(e) => {
                warn!(error = %e, "Platform client initialization failed");
                // The client may already have reported this attempt as an event.
                if self.transition(ConnectionState::Disconnected) {
                    self.handle_failure(&e.to_string());
                }
                InitializeOutcome::Failed(e)
            }
        }
    }

    /// Process platform events until shutdown.
    ///
    /// Inbound messages are forwarded to `messages` while the connection is
    /// `Ready` and dropped otherwise.
    pub async fn run(
        self: Arc<Self>,
        messages: mpsc::Sender<InboundMessage>,
    ) -> Result<(), SupervisorError> {
        let mut events = lock(&self.events_rx)
            .take()
            .ok_or(SupervisorError::AlreadyRunning)?;

        loop {
            let event = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };
            self.handle_event(event, &messages).await;
        }

        debug!("Supervisor event loop stopped");
        Ok(())
    }

    /// Resolve once the supervisor has failed permanently or shut down
    pub async fn wait_terminal(&self) -> SupervisorExit {
        let mut state = self.state.subscribe();
        loop {
            if state.borrow_and_update().is_terminal() {
                return SupervisorExit::Failed;
            }
            tokio::select! {
                _ = self.shutdown.cancelled() => return SupervisorExit::ShutDown,
                changed = state.changed() => {
                    if changed.is_err() {
                        return SupervisorExit::ShutDown;
                    }
                }
            }
        }
    }

    /// Cancel pending retries and disconnect the client
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let disconnect = self.client.disconnect();
        match tokio::time::timeout(self.settings.call_timeout, disconnect).await {
            Ok(Ok(())) => info!("Platform client disconnected"),
            Ok(Err(e)) => warn!(error = %e, "Platform client did not disconnect cleanly"),
            Err(_) => warn!("Platform client disconnect timed out"),
        }
    }

    /// End the session for good: disconnect and delete the stored session
    pub async fn logout(&self) {
        self.shutdown().await;
        *lock(&self.session) = SessionSlot::Absent;
        self.session_present.store(false, Ordering::SeqCst);

        let id = self.store.session_id().clone();
        match tokio::time::timeout(self.settings.store_timeout, self.store.delete(&id)).await {
            Ok(Ok(())) => info!(session = %id, "Logged out, stored session deleted"),
            Ok(Err(e)) => warn!(session = %id, error = %e, "Could not delete stored session"),
            Err(_) => warn!(session = %id, "Deleting stored session timed out"),
        }
    }

    async fn handle_event(
        self: &Arc<Self>,
        event: PlatformEvent,
        messages: &mpsc::Sender<InboundMessage>,
    ) {
        match event {
            PlatformEvent::Qr(challenge) => {
                self.transition(ConnectionState::AwaitingAuthentication);
                if self.state() == ConnectionState::AwaitingAuthentication {
                    info!("Authentication required, presenting challenge");
                    self.presenter.present(&challenge);
                }
            }
            PlatformEvent::Authenticated => {
                info!("Authentication completed");
                self.presenter.authenticated();
            }
            PlatformEvent::AuthenticationFailure(reason) => {
                warn!(reason = %reason, "Platform rejected authentication");
                self.discard_session();
                if self.transition(ConnectionState::Disconnected) {
                    self.handle_failure(&format!("authentication rejected: {reason}"));
                }
            }
            PlatformEvent::Ready => {
                if self.transition(ConnectionState::Ready) {
                    self.failures.store(0, Ordering::SeqCst);
                    info!("Platform client ready");
                }
            }
            PlatformEvent::Disconnected(reason) => {
                if self.transition(ConnectionState::Disconnected) {
                    warn!(reason = %reason, "Platform connection dropped");
                    self.handle_failure(&reason);
                }
            }
            PlatformEvent::SessionUpdate(payload) => self.replace_session(payload),
            PlatformEvent::Message(message) => {
                let state = self.state();
                if !state.accepts_messages() {
                    debug!(state = %state, sender = %message.sender_id, "Not ready, dropping message");
                    return;
                }
                if messages.send(message).await.is_err() {
                    debug!("Dispatcher stopped, dropping message");
                }
            }
        }
    }

    /// Move to `next` if the state machine allows it. Returns whether the
    /// state changed.
    fn transition(&self, next: ConnectionState) -> bool {
        self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            if !current.can_transition_to(next) {
                debug!(from = %current, to = %next, "Ignoring invalid state transition");
                return false;
            }
            info!(from = %current, to = %next, "Connection state changed");
            *current = next;
            true
        })
    }

    fn handle_failure(self: &Arc<Self>, reason: &str) {
        if self.shutdown.is_cancelled() {
            return;
        }

        let failures = self.failures.fetch_add(1, Ordering::SeqCst) + 1;
        match self.settings.retry.decide(failures) {
            RetryDecision::RetryAfter(delay) => {
                warn!(
                    attempt = failures,
                    max_attempts = self.settings.retry.max_attempts(),
                    delay_ms = delay.as_millis() as u64,
                    reason = %reason,
                    "Scheduling re-initialization"
                );
                self.schedule_retry(delay);
            }
            RetryDecision::GiveUp => {
                error!(
                    failures,
                    reason = %reason,
                    "Retries exhausted, connection failed permanently"
                );
                self.transition(ConnectionState::Failed);
            }
        }
    }

    fn schedule_retry(self: &Arc<Self>, delay: Duration) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                _ = this.shutdown.cancelled() => debug!("Pending re-initialization cancelled"),
                _ = tokio::time::sleep(delay) => {
                    this.initialize().await;
                }
            }
        });
    }

    /// Session to connect with; consults the store only the first time
    async fn current_session(&self) -> Option<Session> {
        {
            let slot = lock(&self.session);
            match &*slot {
                SessionSlot::Present(session) => return Some(session.clone()),
                SessionSlot::Absent => return None,
                SessionSlot::Unloaded => {}
            }
        }

        let loaded = match tokio::time::timeout(self.settings.store_timeout, self.store.load()).await
        {
            Ok(loaded) => loaded,
            Err(_) => {
                warn!("Loading the stored session timed out, starting without one");
                None
            }
        };

        match &loaded {
            Some(session) => info!(
                session = %session.id(),
                updated_at = %session.updated_at(),
                "Restored stored session"
            ),
            None => info!("No stored session, a fresh authentication will be required"),
        }

        let mut slot = lock(&self.session);
        // A session update may have arrived while the store was read.
        if matches!(*slot, SessionSlot::Unloaded) {
            *slot = match &loaded {
                Some(session) => SessionSlot::Present(session.clone()),
                None => SessionSlot::Absent,
            };
            self.session_present
                .store(loaded.is_some(), Ordering::SeqCst);
        }
        loaded
    }

    fn replace_session(&self, payload: Vec<u8>) {
        let session = {
            let mut slot = lock(&self.session);
            let next = match &*slot {
                SessionSlot::Present(current) => current.replaced_by(payload),
                _ => Session::new(self.store.session_id().clone(), payload),
            };
            *slot = SessionSlot::Present(next.clone());
            next
        };
        self.session_present.store(true, Ordering::SeqCst);
        info!(session = %session.id(), "Session updated");

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let store = Arc::clone(&self.store);
        let last_saved = Arc::clone(&self.last_saved);
        let timeout = self.settings.store_timeout;

        tokio::spawn(async move {
            let mut last_saved = last_saved.lock().await;
            if *last_saved > generation {
                debug!(generation, "Skipping save of superseded session");
                return;
            }

            match tokio::time::timeout(timeout, store.save(&session)).await {
                Ok(Ok(())) => {
                    *last_saved = generation;
                    match store.persistence() {
                        PersistenceMode::Durable => debug!(session = %session.id(), "Session saved"),
                        PersistenceMode::Manual => info!(
                            session = %session.id(),
                            "Session handed to the operator for manual persistence"
                        ),
                    }
                }
                Ok(Err(e)) => warn!(
                    error = %e,
                    "Could not persist session; re-authentication will be required after a restart"
                ),
                Err(_) => warn!(
                    "Saving the session timed out; re-authentication will be required after a restart"
                ),
            }
        });
    }

    /// Forget a session the platform rejected, in memory and in the store
    fn discard_session(&self) {
        *lock(&self.session) = SessionSlot::Absent;
        self.session_present.store(false, Ordering::SeqCst);

        let store = Arc::clone(&self.store);
        let timeout = self.settings.store_timeout;
        tokio::spawn(async move {
            let id = store.session_id().clone();
            match tokio::time::timeout(timeout, store.delete(&id)).await {
                Ok(Ok(())) => info!(session = %id, "Deleted rejected session"),
                Ok(Err(e)) => warn!(session = %id, error = %e, "Could not delete rejected session"),
                Err(_) => warn!(session = %id, "Deleting rejected session timed out"),
            }
        });
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
