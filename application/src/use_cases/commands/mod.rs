//! Built-in commands.
//!
//! | Command | Behaviour |
//! |---------|-----------|
//! | `menu` | list every registered command |
//! | `ping` | round-trip latency, edited into the provisional reply |
//! | `jid` | echo the conversation identifier |
//! | `forward <jid>` | forward the current (or quoted) message |

mod forward;
mod jid;
mod menu;
mod ping;

pub use forward::{ForwardCurrentCommand, ForwardQuotedCommand};
pub use jid::JidCommand;
pub use menu::{MenuCommand, render_menu};
pub use ping::PingCommand;
