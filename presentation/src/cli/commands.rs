//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for courier
#[derive(Parser, Debug)]
#[command(name = "courier")]
#[command(author, version, about = "Chat command bot with persistent sessions")]
#[command(long_about = r#"
Courier connects to a messaging platform, keeps its authentication session
across restarts, and answers prefixed chat commands (.menu, .ping, .jid,
.forward <jid>).

Configuration is read from (highest priority first):
1. Environment variables   SESSION_ID, SESSION_BACKEND, PORT, ...
2. --config <path>         Explicit config file
3. ./courier.toml          Project-level config

SESSION_ID is required.

Example:
  SESSION_ID=mybot courier
  SESSION_ID=mybot SESSION_BACKEND=remote REMOTE_KV_URL=https://kv.example/v1 courier -v
"#)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Health server port (overrides PORT)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Verbosity level (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Show the resolved configuration and its sources, then exit
    #[arg(long)]
    pub show_config: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["courier"]);
        assert!(cli.config.is_none());
        assert!(cli.port.is_none());
        assert_eq!(cli.verbose, 0);
        assert!(!cli.show_config);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from([
            "courier",
            "-vv",
            "--port",
            "8080",
            "--config",
            "bot.toml",
            "--log-file",
            "bot.log",
            "--show-config",
        ]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.port, Some(8080));
        assert_eq!(cli.config, Some(PathBuf::from("bot.toml")));
        assert_eq!(cli.log_file, Some(PathBuf::from("bot.log")));
        assert!(cli.show_config);
    }
}
