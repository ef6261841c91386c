use std::{env, fs, net::SocketAddr, path::PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            database_path: default_database_path(),
            database_max_connections: default_max_connections(),
        }
    }
}

impl AppConfig {
    const CONFIG_ENV: &'static str = "CORKBOARD_CONFIG_FILE";
    const BIND_ADDRESS_ENV: &'static str = "CORKBOARD_BIND_ADDRESS";
    const DATABASE_PATH_ENV: &'static str = "CORKBOARD_DATABASE_PATH";
    const MAX_CONNECTIONS_ENV: &'static str = "CORKBOARD_DATABASE_MAX_CONNECTIONS";

    /// Load configuration from defaults layered with an optional config file
    /// and environment variables.
    pub fn load() -> Result<Self> {
        Self::load_with(None)
    }

    pub fn load_with(config_path: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = Self::resolve_config_path(config_path)? {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("failed to read config file: {}", path.display()))?;
            let file_config: Self = toml::from_str(&contents)
                .with_context(|| format!("invalid config file: {}", path.display()))?;

            config = file_config;
        }

        if let Ok(addr) = env::var(Self::BIND_ADDRESS_ENV) {
            config.bind_address = addr
                .parse()
                .with_context(|| format!("invalid {name}", name = Self::BIND_ADDRESS_ENV))?;
        }

        if let Ok(path) = env::var(Self::DATABASE_PATH_ENV) {
            config.database_path = path;
        }

        if let Ok(value) = env::var(Self::MAX_CONNECTIONS_ENV) {
            config.database_max_connections = value
                .parse()
                .with_context(|| format!("invalid {name}", name = Self::MAX_CONNECTIONS_ENV))?;
        }

        Ok(config)
    }

    fn resolve_config_path(explicit: Option<PathBuf>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            return Self::validate_path(path);
        }

        if let Ok(path) = env::var(Self::CONFIG_ENV) {
            return Self::validate_path(PathBuf::from(path));
        }

        let candidate = PathBuf::from("corkboard.toml");
        if candidate.exists() {
            return Ok(Some(candidate));
        }

        Ok(None)
    }

    fn validate_path(path: PathBuf) -> Result<Option<PathBuf>> {
        if path.exists() {
            Ok(Some(path))
        } else {
            Err(anyhow!(
                "configuration file does not exist: {}",
                path.display()
            ))
        }
    }
}

fn default_bind_address() -> SocketAddr {
    "127.0.0.1:8082"
        .parse()
        .expect("default bind address must be valid")
}

fn default_database_path() -> String {
    "./data/corkboard.db".to_owned()
}

fn default_max_connections() -> u32 {
    8
}
