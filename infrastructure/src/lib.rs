//! Infrastructure layer for courier
//!
//! This crate contains adapters that implement the ports defined
//! in the domain and application layers, including configuration loading.

pub mod config;
pub mod platform;
pub mod session;

// Re-export commonly used types
pub use config::{ConfigError, ConfigLoader, FileConfig, RuntimeConfig, SessionBackendConfig};
pub use platform::ConsolePlatformClient;
#[cfg(feature = "remote-store")]
pub use session::HttpKeyValueClient;
pub use session::{
    EnvSessionStore, KeyValueClient, LocalSessionStore, RemoteKvSessionStore, SessionDecodeError,
};
