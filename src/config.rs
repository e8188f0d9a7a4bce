//! Store connection settings.
//!
//! Settings come from a TOML document, a file, or `REDIS_*` environment
//! variables. Missing values fall back to a local server on the default port.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

/// Error type for loading and validating configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration file could not be read.
    Io(String),
    /// The document or an environment value could not be parsed.
    Parse(String),
    /// A value was parsed but is not usable.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "config io error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "config parse error: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Connection settings for a Redis-compatible server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub database: i64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Upper bound on open connections held by the store.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

fn default_addr() -> String {
    "127.0.0.1:6379".to_string()
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_pool_size() -> u32 {
    10
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            password: None,
            database: 0,
            connect_timeout_secs: default_connect_timeout(),
            pool_size: default_pool_size(),
        }
    }
}

impl RedisConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: RedisConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Read `REDIS_ADDR`, `REDIS_PASSWORD`, `REDIS_DB`, `REDIS_CONNECT_TIMEOUT`
    /// and `REDIS_POOL_SIZE`, keeping defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(addr) = lookup("REDIS_ADDR") {
            config.addr = addr;
        }
        config.password = lookup("REDIS_PASSWORD").filter(|p| !p.is_empty());
        if let Some(db) = lookup("REDIS_DB") {
            config.database = db
                .parse()
                .map_err(|_| ConfigError::Parse(format!("REDIS_DB: {:?}", db)))?;
        }
        if let Some(timeout) = lookup("REDIS_CONNECT_TIMEOUT") {
            config.connect_timeout_secs = timeout
                .parse()
                .map_err(|_| ConfigError::Parse(format!("REDIS_CONNECT_TIMEOUT: {:?}", timeout)))?;
        }
        if let Some(size) = lookup("REDIS_POOL_SIZE") {
            config.pool_size = size
                .parse()
                .map_err(|_| ConfigError::Parse(format!("REDIS_POOL_SIZE: {:?}", size)))?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.addr.trim().is_empty() {
            return Err(ConfigError::Invalid("addr must not be empty".into()));
        }
        if self.database < 0 {
            return Err(ConfigError::Invalid("database must not be negative".into()));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "connect_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.pool_size == 0 {
            return Err(ConfigError::Invalid("pool_size must be greater than zero".into()));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// `redis://[:password@]addr/db`
    pub fn connection_url(&self) -> String {
        match &self.password {
            Some(password) => format!("redis://:{}@{}/{}", password, self.addr, self.database),
            None => format!("redis://{}/{}", self.addr, self.database),
        }
    }
}
