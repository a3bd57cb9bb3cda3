#![forbid(unsafe_code)]

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config/inventory.toml";
const ENV_PREFIX: &str = "INVENTORY";

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct InventoryConfig {
    #[serde(default = "default_products_dir")]
    pub products_dir: PathBuf,
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,
    #[serde(default = "default_session_ttl_seconds")]
    pub session_ttl_seconds: u64,
    #[serde(default = "default_file_token_ttl_seconds")]
    pub file_token_ttl_seconds: u64,
}

fn default_products_dir() -> PathBuf {
    PathBuf::from("Products")
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_session_ttl_seconds() -> u64 {
    12 * 60 * 60
}

fn default_file_token_ttl_seconds() -> u64 {
    300
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            products_dir: default_products_dir(),
            storage_dir: default_storage_dir(),
            session_ttl_seconds: default_session_ttl_seconds(),
            file_token_ttl_seconds: default_file_token_ttl_seconds(),
        }
    }
}

impl InventoryConfig {
    /// Loads `config/inventory.toml` (optional) overlaid with `INVENTORY__*`
    /// environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

        let settings = match builder.build() {
            Ok(settings) => settings,
            Err(err) => {
                // An unreadable file falls back to the environment alone.
                tracing::warn!(path = %path.display(), error = %err, "config file ignored");
                Config::builder()
                    .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "failed to load configuration from file ({err}) and env ({env_err})"
                        ))
                    })?
            }
        };
        settings.try_deserialize()
    }
}
