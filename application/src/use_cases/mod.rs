//! Use cases
//!
//! - [`connection_supervisor`] keeps the platform connection alive
//! - [`dispatcher`] turns inbound messages into command handler runs
//! - [`command_registry`] and [`commands`] define what the bot can do
//! - [`bot_runtime`] runs both and stops them in order

pub mod bot_runtime;
pub mod command_registry;
pub mod commands;
pub mod connection_supervisor;
pub mod context;
pub mod dispatcher;
pub mod status;
