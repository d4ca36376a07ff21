//! Kiosk server configuration: a TOML file plus environment overrides.
//!
//! | variable              | overrides             |
//! |-----------------------|-----------------------|
//! | `AVATAR_HOST`         | `server.host`         |
//! | `AVATAR_PORT`         | `server.port`         |
//! | `AVATAR_LOG_LEVEL`    | `logging.level`       |
//! | `AVATAR_LOG_JSON`     | `logging.json`        |
//! | `LIVEAVATAR_API_URL`  | `liveavatar.api_url`  |
//! | `LIVEAVATAR_API_KEY`  | `liveavatar.api_key`  |
//!
//! Values that fail to parse are ignored with a warning.

use avatar_voice::UpstreamConfig;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use thiserror::Error;

const ENV_OVERRIDES: &[&str] = &[
    "AVATAR_HOST",
    "AVATAR_PORT",
    "AVATAR_LOG_LEVEL",
    "AVATAR_LOG_JSON",
    "LIVEAVATAR_API_URL",
    "LIVEAVATAR_API_KEY",
];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    /// Upstream voice API.
    pub liveavatar: UpstreamConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `"info"` or `"avatar_voice=debug,info"`.
    pub level: String,
    /// Emit one JSON object per line instead of human-readable text.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Config {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.host, self.server.port)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads `path` (a missing file means defaults) and applies environment
/// overrides.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    load_config_with(path, |key| std::env::var(key).ok())
}

fn load_config_with(
    path: Option<&str>,
    var: impl Fn(&str) -> Option<String>,
) -> Result<Config, ConfigError> {
    let mut config = match path.map(std::fs::read_to_string) {
        None => Config::default(),
        Some(Ok(contents)) => toml::from_str(&contents)?,
        Some(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => Config::default(),
        Some(Err(e)) => return Err(e.into()),
    };

    for &key in ENV_OVERRIDES {
        if let Some(value) = var(key) {
            apply_override(&mut config, key, value);
        }
    }
    Ok(config)
}

fn apply_override(config: &mut Config, key: &str, value: String) {
    let parsed = match key {
        "AVATAR_HOST" => value.parse::<IpAddr>().map(|host| config.server.host = host).is_ok(),
        "AVATAR_PORT" => value.parse::<u16>().map(|port| config.server.port = port).is_ok(),
        "AVATAR_LOG_LEVEL" => {
            config.logging.level = value;
            true
        }
        "AVATAR_LOG_JSON" => {
            config.logging.json = matches!(value.as_str(), "true" | "1");
            true
        }
        "LIVEAVATAR_API_URL" => {
            config.liveavatar.api_url = value;
            true
        }
        "LIVEAVATAR_API_KEY" => {
            config.liveavatar.api_key = value;
            true
        }
        _ => true,
    };
    if !parsed {
        tracing::warn!(variable = key, "ignoring unparsable environment override");
    }
}
