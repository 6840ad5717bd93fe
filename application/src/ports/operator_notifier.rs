//! Operator notification port.
//!
//! Some session backends cannot persist on their own: an environment-encoded
//! session lives in deployment configuration that is immutable at runtime.
//! Those backends hand the encoded value to the operator through this port
//! instead, and the operator stores it externally.

/// Something the operator has to do by hand
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorNotice {
    /// Set `variable` to `encoded` so the next start resumes this session
    PersistSession {
        variable: &'static str,
        encoded: String,
    },
    /// Remove `variable`; the stored session is no longer valid
    ClearSession { variable: &'static str },
}

/// Side channel to the human running the bot
pub trait OperatorNotifier: Send + Sync {
    fn notify(&self, notice: &OperatorNotice);
}
