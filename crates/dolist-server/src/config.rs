//! Server configuration for `dolist-sync`.
//!
//! Loaded once at startup from environment variables. Everything has a
//! default except the admin token, which must be set to a real secret.

use std::net::SocketAddr;
use std::path::PathBuf;

use dolist_core::gate::AdminToken;

/// Port used when neither `DOLIST_BIND_ADDR` nor `PORT` is set.
pub const DEFAULT_PORT: u16 = 3000;

/// Placeholder token shipped in old sample deployments. Refused at startup.
const PLACEHOLDER_ADMIN_TOKEN: &str = "your-secure-admin-token";

/// Errors while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `ADMIN_TOKEN` is unset or empty.
    #[error("ADMIN_TOKEN must be set to a non-empty secret")]
    MissingAdminToken,

    /// `ADMIN_TOKEN` is set to the well-known placeholder value.
    #[error("ADMIN_TOKEN is set to the sample placeholder value; choose a real secret")]
    PlaceholderAdminToken,

    /// A variable holds a value that cannot be parsed.
    #[error("invalid value for {var}: '{value}' ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Secret required in the `Admin-Token` header to mint keys.
    pub admin_token: AdminToken,
    /// Directory holding one JSON document per API key.
    pub data_dir: PathBuf,
    /// JSON array file listing valid API keys.
    pub keys_file: PathBuf,
    /// Log level filter used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// Environment variables:
    /// - `DOLIST_BIND_ADDR`: full bind address (overrides `PORT`)
    /// - `PORT`: port to bind on `0.0.0.0` (default: `3000`)
    /// - `ADMIN_TOKEN`: admin secret (required)
    /// - `DOLIST_DATA_DIR`: document directory (default: `./data`)
    /// - `DOLIST_KEYS_FILE`: API key file (default: `./api-keys.json`)
    /// - `DOLIST_LOG_LEVEL`: log filter (default: `info`)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the admin token is missing or a value does
    /// not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`ServerConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = if let Some(addr) = lookup("DOLIST_BIND_ADDR") {
            addr.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
                var: "DOLIST_BIND_ADDR",
                value: addr.clone(),
                reason: e.to_string(),
            })?
        } else if let Some(port_str) = lookup("PORT") {
            let port = port_str.parse::<u16>().map_err(|e| {
                ConfigError::Invalid {
                    var: "PORT",
                    value: port_str.clone(),
                    reason: e.to_string(),
                }
            })?;
            SocketAddr::from(([0, 0, 0, 0], port))
        } else {
            SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT))
        };

        let admin_token = match lookup("ADMIN_TOKEN") {
            None => return Err(ConfigError::MissingAdminToken),
            Some(token) if token.trim().is_empty() => {
                return Err(ConfigError::MissingAdminToken);
            }
            Some(token) if token == PLACEHOLDER_ADMIN_TOKEN => {
                return Err(ConfigError::PlaceholderAdminToken);
            }
            Some(token) => AdminToken::new(token),
        };

        let data_dir = lookup("DOLIST_DATA_DIR")
            .map_or_else(|| PathBuf::from("./data"), PathBuf::from);

        let keys_file = lookup("DOLIST_KEYS_FILE")
            .map_or_else(|| PathBuf::from("./api-keys.json"), PathBuf::from);

        let log_level = lookup("DOLIST_LOG_LEVEL").unwrap_or_else(|| "info".to_owned());

        Ok(Self {
            bind_addr,
            admin_token,
            data_dir,
            keys_file,
            log_level,
        })
    }
}
