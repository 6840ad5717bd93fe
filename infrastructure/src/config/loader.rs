//! Configuration loader with multi-source merging

use super::file_config::{ConfigError, FileConfig};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// Environment variables the bot reads
pub const ENV_KEYS: &[&str] = &[
    "SESSION_ID",
    "SESSION_DATA",
    "SESSION_BACKEND",
    "SESSION_DIR",
    "REMOTE_KV_URL",
    "PORT",
    "RETRY_MAX_ATTEMPTS",
    "RETRY_BASE_DELAY_MS",
    "RETRY_BACKOFF_MULTIPLIER",
    "COMMAND_PREFIX",
    "FORWARD_MODE",
    "HANDLER_TIMEOUT_MS",
    "CALL_TIMEOUT_MS",
    "STORE_TIMEOUT_MS",
    "SHUTDOWN_GRACE_MS",
    "BOT_NAME",
    "REPLY_ON_FAILURE",
];

const PROJECT_CONFIG: &str = "courier.toml";

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables ([`ENV_KEYS`])
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./courier.toml`
    /// 4. Default values
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, ConfigError> {
        Self::extract(Self::figment(config_path))
    }

    /// Build the layered figment without extracting it
    pub fn figment(config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::raw().only(ENV_KEYS))
    }

    pub fn extract(figment: Figment) -> Result<FileConfig, ConfigError> {
        figment.extract().map_err(|e| ConfigError::Figment(Box::new(e)))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        let path = PathBuf::from(PROJECT_CONFIG);
        path.exists().then_some(path)
    }

    /// Print the config file locations being used (for debugging)
    pub fn print_config_sources(config_path: Option<&Path>) {
        println!("Configuration sources (in priority order):");
        println!("  [ENV  ] {}", ENV_KEYS.join(", "));

        if let Some(path) = config_path {
            let found = if path.exists() { "FOUND" } else { "     " };
            println!("  [{found}] Explicit: {}", path.display());
        }

        match Self::project_config_path() {
            Some(path) => println!("  [FOUND] Project: {}", path.display()),
            None => println!("  [     ] Project: ./{PROJECT_CONFIG}"),
        }

        println!("  [     ] Default: built-in defaults");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_extract() {
        let config = ConfigLoader::extract(Figment::from(Serialized::defaults(
            FileConfig::default(),
        )))
        .unwrap();
        assert_eq!(config, FileConfig::default());
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "session_id = \"from-file\"\nport = 4000").unwrap();

        let figment = Figment::new()
            .merge(Serialized::defaults(FileConfig::default()))
            .merge(Toml::file(file.path()));
        let config = ConfigLoader::extract(figment).unwrap();

        assert_eq!(config.session_id.as_deref(), Some("from-file"));
        assert_eq!(config.port, 4000);
        assert_eq!(config.command_prefix, ".");
    }

    #[test]
    fn test_later_layers_win() {
        let figment = Figment::new()
            .merge(Serialized::defaults(FileConfig::default()))
            .merge(Toml::string("session_id = \"file\"\nbot_name = \"Filed\""))
            .merge(Serialized::globals(serde_json::json!({
                "session_id": "env",
                "port": 8080
            })));
        let config = ConfigLoader::extract(figment).unwrap();

        assert_eq!(config.session_id.as_deref(), Some("env"));
        assert_eq!(config.bot_name, "Filed");
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_numeric_env_values_load_as_text() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SESSION_ID", "2348012345678");
            jail.set_env("BOT_NAME", "true");
            jail.set_env("SESSION_DATA", "12345");
            jail.set_env("PORT", "8080");

            let config = ConfigLoader::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.session_id.as_deref(), Some("2348012345678"));
            assert_eq!(config.bot_name, "true");
            assert_eq!(config.session_data.as_deref(), Some("12345"));
            assert_eq!(config.port, 8080);

            let runtime = config.into_runtime_config().map_err(|e| e.to_string())?;
            assert_eq!(runtime.bot.session_id.as_str(), "2348012345678");
            Ok(())
        });
    }

    #[test]
    fn test_project_file_is_picked_up() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("courier.toml", "session_id = \"from-project\"")?;
            jail.set_env("BOT_NAME", "Env Bot");

            let config = ConfigLoader::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.session_id.as_deref(), Some("from-project"));
            assert_eq!(config.bot_name, "Env Bot");
            Ok(())
        });
    }

    #[test]
    fn test_type_errors_are_reported() {
        let figment = Figment::new()
            .merge(Serialized::defaults(FileConfig::default()))
            .merge(Toml::string("port = \"not a port\""));
        assert!(matches!(
            ConfigLoader::extract(figment),
            Err(ConfigError::Figment(_))
        ));
    }
}
