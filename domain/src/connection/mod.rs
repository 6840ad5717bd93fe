//! Connection lifecycle domain.
//!
//! - [`state::ConnectionState`]: the supervisor's state machine
//! - [`retry::RetryPolicy`]: exponential backoff for re-initialization

pub mod retry;
pub mod state;
