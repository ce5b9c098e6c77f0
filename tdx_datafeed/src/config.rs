//! Datafeed configuration: parsing, environment overrides and validation.
//!
//! Settings come from three layers, later ones winning:
//! 1. built-in defaults ([`DatafeedConfig::default`]),
//! 2. an optional TOML file ([`load_config_path`] / [`load_config_str`]),
//! 3. `TDX_*` environment variables ([`DatafeedConfig::with_env_overrides`]).
//!
//! Credentials are held as [`SecretString`] and are never printed by `Debug`.
//!
//! ```toml
//! host = "tdx.xmzq.com.cn"
//! port = 7709
//! connect_timeout_ms = 5000
//! requests_per_second = 20
//! username = "alice"
//! password = "hunter2"
//! ```

use std::{num::NonZeroU32, path::Path, time::Duration};

use nonzero_ext::nonzero;
use secrecy::SecretString;
use serde::Deserialize;
use shared_utils::env::{InvalidEnvVarError, get_env_var_opt, parse_env_var};
use thiserror::Error;

pub const DEFAULT_HOST: &str = "tdx.xmzq.com.cn";
pub const DEFAULT_PORT: u16 = 7709;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Env(#[from] InvalidEnvVarError),

    #[error("Invalid setting `{name}`: {message}")]
    Invalid { name: &'static str, message: String },
}

/// On-disk shape. Every field is optional so a partial file only overrides
/// what it names.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    host: Option<String>,
    port: Option<u16>,
    connect_timeout_ms: Option<u64>,
    requests_per_second: Option<u32>,
    username: Option<String>,
    password: Option<String>,
}

/// Resolved settings for the TDX quote service.
#[derive(Debug, Clone)]
pub struct DatafeedConfig {
    pub host: String,
    pub port: u16,
    pub connect_timeout: Duration,
    /// Upper bound on page requests per second within one session.
    pub requests_per_second: NonZeroU32,
    /// Account name; the standard quote service accepts anonymous sessions.
    pub username: Option<SecretString>,
    pub password: Option<SecretString>,
}

impl Default for DatafeedConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            requests_per_second: nonzero!(20u32),
            username: None,
            password: None,
        }
    }
}

impl DatafeedConfig {
    /// `host:port` as accepted by `TcpStream::connect`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Apply `TDX_HOST`, `TDX_PORT`, `TDX_USERNAME` and `TDX_PASSWORD`.
    /// Unset or blank variables leave the current value alone.
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Some(host) = get_env_var_opt("TDX_HOST") {
            self.host = host;
        }
        if let Some(port) = parse_env_var::<u16>("TDX_PORT")? {
            self.port = port;
        }
        if let Some(user) = get_env_var_opt("TDX_USERNAME") {
            self.username = Some(SecretString::new(user.into()));
        }
        if let Some(pass) = get_env_var_opt("TDX_PASSWORD") {
            self.password = Some(SecretString::new(pass.into()));
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid {
                name: "host",
                message: "must not be empty".into(),
            });
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid {
                name: "port",
                message: "must be non-zero".into(),
            });
        }
        Ok(())
    }

    fn apply(mut self, file: ConfigFile) -> Result<Self, ConfigError> {
        if let Some(host) = file.host {
            self.host = host.trim().to_string();
        }
        if let Some(port) = file.port {
            self.port = port;
        }
        if let Some(ms) = file.connect_timeout_ms {
            if ms == 0 {
                return Err(ConfigError::Invalid {
                    name: "connect_timeout_ms",
                    message: "must be positive".into(),
                });
            }
            self.connect_timeout = Duration::from_millis(ms);
        }
        if let Some(rps) = file.requests_per_second {
            self.requests_per_second =
                NonZeroU32::new(rps).ok_or_else(|| ConfigError::Invalid {
                    name: "requests_per_second",
                    message: "must be positive".into(),
                })?;
        }
        if let Some(user) = file.username {
            self.username = Some(SecretString::new(user.into()));
        }
        if let Some(pass) = file.password {
            self.password = Some(SecretString::new(pass.into()));
        }
        self.validate()?;
        Ok(self)
    }
}

/// Parse a config from a TOML string, on top of the defaults.
pub fn load_config_str(toml_str: &str) -> Result<DatafeedConfig, ConfigError> {
    let file: ConfigFile = toml::from_str(toml_str)?;
    DatafeedConfig::default().apply(file)
}

/// Parse a config file, on top of the defaults.
pub fn load_config_path(path: impl AsRef<Path>) -> Result<DatafeedConfig, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    load_config_str(&text)
}
