//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure and presentation adapters
//! must implement. The session store port lives in the domain layer
//! ([`courier_domain::SessionStore`]) next to the entity it persists.

pub mod auth_presenter;
pub mod operator_notifier;
pub mod platform_client;
