//! Bot runtime configuration

use courier_domain::{CommandPrefix, DomainError, RetryPolicy, SessionId};
use std::time::Duration;

/// Which message `.forward <target>` sends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForwardMode {
    /// Forward the command message itself
    #[default]
    Current,
    /// Forward the message the command replies to
    Quoted,
}

impl std::str::FromStr for ForwardMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "current" => Ok(ForwardMode::Current),
            "quoted" | "quote" => Ok(ForwardMode::Quoted),
            other => Err(format!(
                "unknown forward mode '{other}' (expected 'current' or 'quoted')"
            )),
        }
    }
}

/// Validated runtime settings shared by the use cases.
///
/// Built once at startup by the infrastructure config loader; every value
/// here has already passed validation.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Display name used in the menu and status page
    pub bot_name: String,
    /// Sanitized session identifier
    pub session_id: SessionId,
    pub prefix: CommandPrefix,
    pub forward_mode: ForwardMode,
    pub retry: RetryPolicy,
    /// Budget for one command handler run
    pub handler_timeout: Duration,
    /// Budget for a single platform call (send, forward, edit)
    pub call_timeout: Duration,
    /// Budget for a single session store call
    pub store_timeout: Duration,
    /// Budget for `PlatformClient::connect`
    pub connect_timeout: Duration,
    /// How long in-flight dispatches may run after a shutdown signal
    pub shutdown_grace: Duration,
    /// Send a generic failure reply when a handler fails
    pub reply_on_failure: bool,
}

impl BotConfig {
    pub const DEFAULT_BOT_NAME: &'static str = "Courier Bot";
    pub const DEFAULT_HANDLER_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(15);
    pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(60);
    pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

    /// Defaults for everything but the session identifier
    pub fn new(session_id: SessionId) -> Self {
        Self {
            bot_name: Self::DEFAULT_BOT_NAME.to_string(),
            session_id,
            prefix: CommandPrefix::DEFAULT,
            forward_mode: ForwardMode::default(),
            retry: RetryPolicy::default(),
            handler_timeout: Self::DEFAULT_HANDLER_TIMEOUT,
            call_timeout: Self::DEFAULT_CALL_TIMEOUT,
            store_timeout: Self::DEFAULT_STORE_TIMEOUT,
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
            shutdown_grace: Self::DEFAULT_SHUTDOWN_GRACE,
            reply_on_failure: true,
        }
    }

    /// Sanitize `raw` and build a config with defaults
    pub fn for_raw_session_id(raw: &str) -> Result<Self, DomainError> {
        Ok(Self::new(SessionId::parse(raw)?))
    }

    pub fn with_forward_mode(mut self, mode: ForwardMode) -> Self {
        self.forward_mode = mode;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_handler_timeout(mut self, timeout: Duration) -> Self {
        self.handler_timeout = timeout;
        self
    }
}
