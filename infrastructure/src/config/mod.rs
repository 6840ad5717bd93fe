//! Configuration loading for courier
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. Environment variables (`SESSION_ID`, `PORT`, ...)
//! 2. `--config <path>` specified file
//! 3. Project root: `./courier.toml`
//! 4. Default values

mod file_config;
mod loader;
mod scalar;

pub use file_config::{ConfigError, FileConfig, RuntimeConfig, SessionBackendConfig};
pub use loader::{ConfigLoader, ENV_KEYS};
