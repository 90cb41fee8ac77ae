//! Service configuration loaded from the environment
//!
//! | Variable                      | Default          |
//! |-------------------------------|------------------|
//! | `EVENT_CORE_HTTP_ADDR`        | `0.0.0.0:8080`   |
//! | `EVENT_CORE_STORE`            | `memory`         |
//! | `EVENT_CORE_JOURNAL_DIR`      | `./data/journal` |
//! | `EVENT_CORE_STORE_TIMEOUT_MS` | `5000`           |
//! | `EVENT_CORE_LOG_FORMAT`       | `compact`        |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Which `EventStore` backend to run with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreKind {
    #[default]
    Memory,
    Journal,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreKind::Memory),
            "journal" => Ok(StoreKind::Journal),
            other => Err(format!("unknown store {other}, expected memory or journal")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format {other}, expected compact or json")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub http_addr: SocketAddr,
    pub store: StoreKind,
    pub journal_dir: PathBuf,
    pub store_timeout: Duration,
    pub log_format: LogFormat,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            store: StoreKind::Memory,
            journal_dir: PathBuf::from("./data/journal"),
            store_timeout: Duration::from_millis(5000),
            log_format: LogFormat::Compact,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = parse(&lookup, "EVENT_CORE_HTTP_ADDR")? {
            config.http_addr = addr;
        }
        if let Some(store) = parse(&lookup, "EVENT_CORE_STORE")? {
            config.store = store;
        }
        if let Some(dir) = lookup("EVENT_CORE_JOURNAL_DIR").filter(|d| !d.is_empty()) {
            config.journal_dir = PathBuf::from(dir);
        }
        if let Some(ms) = parse::<u64, _>(&lookup, "EVENT_CORE_STORE_TIMEOUT_MS")? {
            if ms == 0 {
                return Err(ConfigError::Invalid {
                    key: "EVENT_CORE_STORE_TIMEOUT_MS",
                    value: ms.to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
            config.store_timeout = Duration::from_millis(ms);
        }
        if let Some(format) = parse(&lookup, "EVENT_CORE_LOG_FORMAT")? {
            config.log_format = format;
        }

        Ok(config)
    }
}

fn parse<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|err: T::Err| ConfigError::Invalid {
                key,
                value,
                reason: err.to_string(),
            }),
    }
}
