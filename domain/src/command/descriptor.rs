//! Command descriptors

use crate::core::error::DomainError;

/// Static description of a command (Value Object)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDescriptor {
    name: String,
    usage: Option<String>,
    description: String,
}

impl CommandDescriptor {
    /// Create a descriptor.
    ///
    /// Names are matched against lower-cased chat text, so they must be
    /// lower-case and contain no whitespace.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        let valid = !name.is_empty()
            && !name.chars().any(char::is_whitespace)
            && name == name.to_lowercase();
        if !valid {
            return Err(DomainError::InvalidCommandName(name));
        }
        Ok(Self {
            name,
            usage: None,
            description: description.into(),
        })
    }

    /// Argument placeholder shown after the name, e.g. `<jid>`
    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn usage(&self) -> Option<&str> {
        self.usage.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// `.name <usage>` as typed by a user
    pub fn invocation(&self, prefix: char) -> String {
        match &self.usage {
            Some(usage) => format!("{prefix}{} {usage}", self.name),
            None => format!("{prefix}{}", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_with_and_without_usage() {
        let ping = CommandDescriptor::new("ping", "Speed test").unwrap();
        assert_eq!(ping.invocation('.'), ".ping");

        let fwd = CommandDescriptor::new("forward", "Forward message")
            .unwrap()
            .with_usage("<jid>");
        assert_eq!(fwd.invocation('.'), ".forward <jid>");
    }

    #[test]
    fn test_rejects_invalid_names() {
        assert!(CommandDescriptor::new("", "x").is_err());
        assert!(CommandDescriptor::new("two words", "x").is_err());
        assert!(CommandDescriptor::new("Menu", "x").is_err());
    }
}
