use serde::{Deserialize, Serialize};

use std::{env, fs, path::Path};

const DEFAULT_PORT: u16 = 5000;

#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Connection string of the document store; the scheme picks the backend.
    pub store_uri: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origins allowed to call the API from a browser. Empty allows any.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{0} environment variable is required")]
    MissingVar(&'static str),

    #[error("failed to parse {name}: {message}")]
    InvalidVar { name: &'static str, message: String },
}

const fn default_port() -> u16 {
    DEFAULT_PORT
}

fn read_file(path: &str) -> Result<Config, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_string(),
        source,
    })?;

    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_string(),
        source,
    })
}

fn store_uri_from(lookup: &impl Fn(&str) -> Option<String>) -> Option<String> {
    lookup("STORE_URI").or_else(|| lookup("MONGODB_URI"))
}

fn port_from(lookup: &impl Fn(&str) -> Option<String>) -> Result<Option<u16>, ConfigError> {
    lookup("PORT")
        .map(|port| {
            port.parse::<u16>().map_err(|e| ConfigError::InvalidVar {
                name: "PORT",
                message: e.to_string(),
            })
        })
        .transpose()
}

fn origins_from(lookup: &impl Fn(&str) -> Option<String>) -> Option<Vec<String>> {
    lookup("ALLOWED_ORIGINS").map(|origins| {
        origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect()
    })
}

fn load_from_env(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
    Ok(Config {
        store_uri: store_uri_from(&lookup).ok_or(ConfigError::MissingVar("STORE_URI"))?,
        port: port_from(&lookup)?.unwrap_or(DEFAULT_PORT),
        allowed_origins: origins_from(&lookup).unwrap_or_default(),
    })
}

/// Variables set in the environment take precedence over the file.
fn apply_env(
    mut cfg: Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Config, ConfigError> {
    if let Some(store_uri) = store_uri_from(&lookup) {
        cfg.store_uri = store_uri;
    }
    if let Some(port) = port_from(&lookup)? {
        cfg.port = port;
    }
    if let Some(origins) = origins_from(&lookup) {
        cfg.allowed_origins = origins;
    }
    Ok(cfg)
}

fn locate_file(config_path: Option<&str>) -> Option<String> {
    // Try env path
    if let Some(path) = config_path {
        if Path::new(path).exists() {
            return Some(path.to_string());
        }
        tracing::warn!("Config file '{}' not found, falling back to 'config.yaml'", path);
    }

    ["config.yaml", "config.example.yaml"]
        .into_iter()
        .find(|candidate| Path::new(candidate).exists())
        .map(|candidate| {
            if candidate == "config.example.yaml" {
                tracing::warn!(
                    "Falling back to 'config.example.yaml', \
                     this file should be replaced with actual data"
                );
            }
            candidate.to_string()
        })
}

fn load_config_from(
    config_path: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Config, ConfigError> {
    match locate_file(config_path) {
        Some(path) => {
            tracing::info!("Loading config from '{}'", path);
            apply_env(read_file(&path)?, lookup)
        }
        None => {
            tracing::info!(
                "No config file found, attempting to load configuration from environment variables"
            );
            load_from_env(lookup)
        }
    }
}

pub fn load_config() -> Result<Config, ConfigError> {
    let config_path = env::var("TIME_CAPSULE_CONFIG").ok();
    load_config_from(config_path.as_deref(), |name| env::var(name).ok())
}
