//! Read-only status for the health surface

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use courier_domain::{CommandPrefix, ConnectionState};
use serde::Serialize;
use tokio::sync::watch;

/// Point-in-time view of the bot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    #[serde(skip)]
    pub bot_name: String,
    /// How to ask the bot for its menu, e.g. `.menu`
    #[serde(skip)]
    pub menu_command: String,
    pub status: ConnectionState,
    /// Seconds since the process started
    pub uptime: u64,
    pub session_present: bool,
}

/// Cheap, cloneable handle onto the supervisor's observable state
#[derive(Clone)]
pub struct StatusBoard {
    bot_name: Arc<str>,
    prefix: CommandPrefix,
    started_at: Instant,
    state: watch::Receiver<ConnectionState>,
    session_present: Arc<AtomicBool>,
}

impl StatusBoard {
    pub fn new(
        bot_name: &str,
        state: watch::Receiver<ConnectionState>,
        session_present: Arc<AtomicBool>,
    ) -> Self {
        Self {
            bot_name: Arc::from(bot_name),
            prefix: CommandPrefix::DEFAULT,
            started_at: Instant::now(),
            state,
            session_present,
        }
    }

    /// Command prefix shown in the menu hint
    pub fn with_prefix(mut self, prefix: CommandPrefix) -> Self {
        self.prefix = prefix;
        self
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            bot_name: self.bot_name.to_string(),
            menu_command: format!("{}menu", self.prefix),
            status: *self.state.borrow(),
            uptime: self.started_at.elapsed().as_secs(),
            session_present: self.session_present.load(Ordering::SeqCst),
        }
    }
}
