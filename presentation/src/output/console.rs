//! Console output for the operator
//!
//! The bot runs unattended, so the terminal is where a human learns that a
//! challenge has to be completed or a session value has to be stored.

use colored::Colorize;
use courier_application::{AuthChallengePresenter, OperatorNotice, OperatorNotifier};

/// Formats operator-facing console messages
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Authentication challenge box
    pub fn challenge(challenge: &str) -> String {
        format!(
            "{}\n{}\n\n  {}\n\n{}",
            Self::header("Authentication required"),
            "📡 Scan this QR code with your phone:".cyan().bold(),
            challenge,
            Self::footer()
        )
    }

    pub fn authenticated() -> String {
        format!("{}", "✅ Authenticated".green().bold())
    }

    pub fn notice(notice: &OperatorNotice) -> String {
        match notice {
            OperatorNotice::PersistSession { variable, encoded } => format!(
                "{}\n{}\n\n{}={}\n\n{}",
                Self::header("Session changed"),
                format!("Set {variable} to keep this session across restarts:")
                    .yellow()
                    .bold(),
                variable,
                encoded,
                Self::footer()
            ),
            OperatorNotice::ClearSession { variable } => format!(
                "{} {}",
                "⚠".yellow().bold(),
                format!("The stored session was rejected; unset {variable} before the next start.")
                    .yellow()
            ),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn footer() -> String {
        "=".repeat(60).cyan().to_string()
    }
}

/// Prints challenges to stdout
pub struct ConsoleAuthPresenter;

impl AuthChallengePresenter for ConsoleAuthPresenter {
    fn present(&self, challenge: &str) {
        println!("{}", ConsoleFormatter::challenge(challenge));
    }

    fn authenticated(&self) {
        println!("{}", ConsoleFormatter::authenticated());
    }
}

/// Prints operator notices to stderr
pub struct ConsoleOperatorNotifier;

impl OperatorNotifier for ConsoleOperatorNotifier {
    fn notify(&self, notice: &OperatorNotice) {
        eprintln!("{}", ConsoleFormatter::notice(notice));
    }
}
