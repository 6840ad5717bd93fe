//! Authentication challenge presentation port
//!
//! When no valid session exists the platform issues a challenge (a QR
//! payload for most web-based clients). Rendering it is a presentation
//! concern, so the supervisor only hands the raw challenge to this port.

/// Shows authentication challenges to whoever can complete them
pub trait AuthChallengePresenter: Send + Sync {
    /// A new challenge must be completed. Called again whenever the
    /// platform refreshes the challenge.
    fn present(&self, challenge: &str);

    /// The challenge was completed
    fn authenticated(&self) {}
}
