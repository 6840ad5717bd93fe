//! Command parsing domain.
//!
//! - [`parsing::parse_command`]: the single rule turning chat text into a command
//! - [`descriptor::CommandDescriptor`]: name, usage and help line of a command

pub mod descriptor;
pub mod parsing;
