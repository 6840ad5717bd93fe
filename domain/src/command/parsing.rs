//! Chat text → command parsing

use crate::core::error::DomainError;

/// Character that marks a chat message as a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandPrefix(char);

impl CommandPrefix {
    pub const DEFAULT: CommandPrefix = CommandPrefix('.');

    pub fn new(prefix: char) -> Result<Self, DomainError> {
        if prefix.is_whitespace() {
            return Err(DomainError::InvalidCommandPrefix(prefix.to_string()));
        }
        Ok(Self(prefix))
    }

    pub fn as_char(self) -> char {
        self.0
    }
}

impl Default for CommandPrefix {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::fmt::Display for CommandPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CommandPrefix {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::new(c),
            _ => Err(DomainError::InvalidCommandPrefix(s.to_string())),
        }
    }
}

/// A command extracted from chat text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Lower-cased name without the prefix
    pub name: String,
    /// Everything after the first whitespace run, trimmed
    pub args: String,
}

impl ParsedCommand {
    /// Arguments split on whitespace
    pub fn arg_list(&self) -> Vec<&str> {
        self.args.split_whitespace().collect()
    }
}

/// Parse chat text into a command.
///
/// The text is trimmed and lower-cased, then split on the first whitespace
/// run. The leading token must start with `prefix`; what follows the prefix
/// is the command name. Anything else is ordinary chat and yields `None`.
pub fn parse_command(text: &str, prefix: CommandPrefix) -> Option<ParsedCommand> {
    let normalized = text.trim().to_lowercase();
    let (head, rest) = match normalized.find(char::is_whitespace) {
        Some(idx) => normalized.split_at(idx),
        None => (normalized.as_str(), ""),
    };

    let name = head.strip_prefix(prefix.as_char())?;
    if name.is_empty() {
        return None;
    }

    Some(ParsedCommand {
        name: name.to_string(),
        args: rest.trim().to_string(),
    })
}
