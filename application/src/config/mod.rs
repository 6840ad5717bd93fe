//! Application-level configuration.
//!
//! - [`BotConfig`]: validated runtime settings for supervisor and dispatcher
//! - [`ForwardMode`]: which `.forward` variant is bound to the command name

pub mod bot_config;

pub use bot_config::{BotConfig, ForwardMode};
