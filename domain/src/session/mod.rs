//! Authentication session domain.
//!
//! - [`entities::SessionId`]: sanitized identifier a session is stored under
//! - [`entities::Session`]: opaque authentication blob issued by the platform
//! - [`repository::SessionStore`]: trait for session persistence backends

pub mod entities;
pub mod repository;
