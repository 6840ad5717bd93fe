//! Session store backends
//!
//! - [`LocalSessionStore`]: one JSON file per session id on disk
//! - [`EnvSessionStore`]: read from `SESSION_DATA`, persisted by the operator
//! - [`RemoteKvSessionStore`]: an external key-value service

pub mod codec;
mod env;
mod local;
mod remote;

pub use codec::SessionDecodeError;
pub use env::{EnvSessionStore, SESSION_DATA_VAR};
pub use local::LocalSessionStore;
#[cfg(feature = "remote-store")]
pub use remote::HttpKeyValueClient;
pub use remote::{KeyValueClient, RemoteKvSessionStore, session_key};
