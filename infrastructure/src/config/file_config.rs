//! Raw configuration data
//!
//! Keys match the environment variable names, lower-cased, so the same
//! value can come from `courier.toml` or the environment:
//!
//! ```toml
//! session_id = "mybot"
//! session_backend = "local"
//! session_dir = ".courier_auth"
//! port = 3000
//! retry_max_attempts = 5
//! command_prefix = "."
//! forward_mode = "current"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use courier_application::{BotConfig, ForwardMode};
use courier_domain::{CommandPrefix, RetryPolicy, SessionId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::scalar;

/// Fatal configuration problems; the bot refuses to start
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("SESSION_ID is required")]
    MissingSessionId,

    #[error("SESSION_ID '{raw}' contains no usable characters (allowed: A-Z a-z 0-9 _ -)")]
    EmptySessionId { raw: String },

    #[error("REMOTE_KV_URL is required when SESSION_BACKEND=remote")]
    MissingRemoteUrl,

    #[error("The remote session backend is not available in this build")]
    RemoteUnavailable,

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(key: &'static str, reason: impl ToString) -> Self {
        ConfigError::Invalid {
            key,
            reason: reason.to_string(),
        }
    }
}

/// Where sessions are persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionBackendConfig {
    Local { dir: PathBuf },
    Env { data: Option<String> },
    Remote { url: String },
}

impl SessionBackendConfig {
    pub fn name(&self) -> &'static str {
        match self {
            SessionBackendConfig::Local { .. } => "local",
            SessionBackendConfig::Env { .. } => "env",
            SessionBackendConfig::Remote { .. } => "remote",
        }
    }
}

/// Validated configuration for the whole process
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub bot: BotConfig,
    pub backend: SessionBackendConfig,
    pub port: u16,
    /// `SESSION_ID` as configured, before sanitization
    pub raw_session_id: String,
}

/// Complete file configuration (raw structure)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    #[serde(deserialize_with = "scalar::option_string")]
    pub session_id: Option<String>,
    /// Base64 session envelope (env backend)
    #[serde(deserialize_with = "scalar::option_string")]
    pub session_data: Option<String>,
    /// `local`, `env` or `remote`
    #[serde(deserialize_with = "scalar::option_string")]
    pub session_backend: Option<String>,
    #[serde(deserialize_with = "scalar::path")]
    pub session_dir: PathBuf,
    #[serde(deserialize_with = "scalar::option_string")]
    pub remote_kv_url: Option<String>,
    /// Health server port
    pub port: u16,
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub retry_backoff_multiplier: u32,
    #[serde(deserialize_with = "scalar::string")]
    pub command_prefix: String,
    /// `current` or `quoted`
    #[serde(deserialize_with = "scalar::string")]
    pub forward_mode: String,
    pub handler_timeout_ms: u64,
    pub call_timeout_ms: u64,
    pub store_timeout_ms: u64,
    pub shutdown_grace_ms: u64,
    #[serde(deserialize_with = "scalar::string")]
    pub bot_name: String,
    pub reply_on_failure: bool,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            session_id: None,
            session_data: None,
            session_backend: None,
            session_dir: PathBuf::from(".courier_auth"),
            remote_kv_url: None,
            port: 3000,
            retry_max_attempts: RetryPolicy::DEFAULT_MAX_ATTEMPTS,
            retry_base_delay_ms: RetryPolicy::DEFAULT_BASE_DELAY.as_millis() as u64,
            retry_backoff_multiplier: RetryPolicy::DEFAULT_MULTIPLIER,
            command_prefix: CommandPrefix::DEFAULT.to_string(),
            forward_mode: "current".to_string(),
            handler_timeout_ms: BotConfig::DEFAULT_HANDLER_TIMEOUT.as_millis() as u64,
            call_timeout_ms: BotConfig::DEFAULT_CALL_TIMEOUT.as_millis() as u64,
            store_timeout_ms: BotConfig::DEFAULT_STORE_TIMEOUT.as_millis() as u64,
            shutdown_grace_ms: BotConfig::DEFAULT_SHUTDOWN_GRACE.as_millis() as u64,
            bot_name: BotConfig::DEFAULT_BOT_NAME.to_string(),
            reply_on_failure: true,
        }
    }
}

impl FileConfig {
    /// Validate everything and build the typed runtime configuration
    pub fn into_runtime_config(self) -> Result<RuntimeConfig, ConfigError> {
        let raw_session_id = self
            .session_id
            .clone()
            .filter(|raw| !raw.trim().is_empty())
            .ok_or(ConfigError::MissingSessionId)?;
        let session_id = SessionId::parse(&raw_session_id).map_err(|_| {
            ConfigError::EmptySessionId {
                raw: raw_session_id.clone(),
            }
        })?;

        let backend = self.backend()?;
        let retry = RetryPolicy::new(
            self.retry_max_attempts,
            Duration::from_millis(self.retry_base_delay_ms),
            self.retry_backoff_multiplier,
        )
        .map_err(|e| ConfigError::invalid("RETRY_BACKOFF_MULTIPLIER", e))?;
        let prefix: CommandPrefix = self
            .command_prefix
            .parse()
            .map_err(|e| ConfigError::invalid("COMMAND_PREFIX", e))?;
        let forward_mode: ForwardMode = self
            .forward_mode
            .parse()
            .map_err(|e| ConfigError::invalid("FORWARD_MODE", e))?;

        let handler_timeout = positive_ms("HANDLER_TIMEOUT_MS", self.handler_timeout_ms)?;
        let call_timeout = positive_ms("CALL_TIMEOUT_MS", self.call_timeout_ms)?;
        let store_timeout = positive_ms("STORE_TIMEOUT_MS", self.store_timeout_ms)?;

        let mut bot = BotConfig::new(session_id)
            .with_forward_mode(forward_mode)
            .with_retry(retry)
            .with_handler_timeout(handler_timeout);
        bot.prefix = prefix;
        bot.call_timeout = call_timeout;
        bot.store_timeout = store_timeout;
        bot.shutdown_grace = Duration::from_millis(self.shutdown_grace_ms);
        bot.reply_on_failure = self.reply_on_failure;
        if !self.bot_name.trim().is_empty() {
            bot.bot_name = self.bot_name.trim().to_string();
        }

        Ok(RuntimeConfig {
            bot,
            backend,
            port: self.port,
            raw_session_id,
        })
    }

    fn backend(&self) -> Result<SessionBackendConfig, ConfigError> {
        let session_data = self
            .session_data
            .clone()
            .filter(|data| !data.trim().is_empty());

        let name = match self.session_backend.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_lowercase(),
            _ if session_data.is_some() => "env".to_string(),
            _ => "local".to_string(),
        };

        match name.as_str() {
            "local" => Ok(SessionBackendConfig::Local {
                dir: self.session_dir.clone(),
            }),
            "env" => Ok(SessionBackendConfig::Env { data: session_data }),
            "remote" => {
                if !cfg!(feature = "remote-store") {
                    return Err(ConfigError::RemoteUnavailable);
                }
                let url = self
                    .remote_kv_url
                    .clone()
                    .filter(|url| !url.trim().is_empty())
                    .ok_or(ConfigError::MissingRemoteUrl)?;
                Ok(SessionBackendConfig::Remote { url })
            }
            other => Err(ConfigError::invalid(
                "SESSION_BACKEND",
                format!("unknown backend '{other}' (expected local, env or remote)"),
            )),
        }
    }

    /// Copy safe to print: the session data is a credential
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.session_data.is_some() {
            copy.session_data = Some("<redacted>".to_string());
        }
        copy
    }
}

fn positive_ms(key: &'static str, ms: u64) -> Result<Duration, ConfigError> {
    if ms == 0 {
        return Err(ConfigError::invalid(key, "must be greater than 0"));
    }
    Ok(Duration::from_millis(ms))
}
