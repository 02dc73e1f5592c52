use std::time::Duration;
use std::{env, fmt, fs, path};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::monitoring::SchedulerConfig;

const DEFAULT_TIMEOUT_MS: u64 = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    ReadFailed {
        path: path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write config file {}: {source}", path.display())]
    WriteFailed {
        path: path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    ParseFailed(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    SerializeFailed(#[from] toml::ser::Error),
    #[error("no config directory available (set XDG_CONFIG_HOME or HOME)")]
    ConfigPathUnavailable,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub ping: PingConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PingConfig {
    pub enabled: bool,
    pub interval_seconds: u64,
    pub timeout_ms: u64,
    pub concurrency: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "netwatch.db".into(), pool_size: 8 }
    }
}

impl Default for PingConfig {
    fn default() -> Self {
        Self { enabled: true, interval_seconds: 300, timeout_ms: DEFAULT_TIMEOUT_MS, concurrency: 8 }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "0.0.0.0".into(), port: 5000 }
    }
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/netwatch/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, ConfigError> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(ConfigError::ConfigPathUnavailable);
    };

    Ok(path.join("netwatch/config.toml"))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" | "" => Some(false),
        _ => None,
    }
}

fn override_with<T>(
    target: &mut T,
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    parse: impl Fn(&str) -> Option<T>,
) {
    let Some(raw) = lookup(name) else {
        return;
    };
    match parse(&raw) {
        Some(value) => *target = value,
        None => warn!(variable = name, value = %raw, "Ignoring unparsable environment override"),
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);

        writeln!(f, "Current Internal Configuration State:")?;
        write_title_1(f, "Database")?;
        write_1(f, "Path", &self.database.path)?;
        write_1(f, "Pool Size", &self.database.pool_size)?;
        write_title_1(f, "Ping")?;
        write_1(f, "Enabled", &self.ping.enabled)?;
        write_1(f, "Interval (s)", &self.ping.interval_seconds)?;
        write_1(f, "Timeout (ms)", &self.ping.timeout_ms)?;
        write_1(f, "Concurrency", &self.ping.concurrency)?;
        write_title_1(f, "Server")?;
        write_1(f, "Bind Address", &self.server.bind)?;
        write_1(f, "Port", &self.server.port)?;

        Ok(())
    }
}

impl Config {
    /// Load the config file, then apply environment overrides and normalise.
    pub fn load(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, ConfigError> {
        let mut config = Self::from_config(optional_path)?;
        config.apply_overrides(&|name: &str| env::var(name).ok());
        config.normalize();
        Ok(config)
    }

    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/netwatch/config.toml
    ///  or the specified path, with the name config.toml if one does not exist
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, ConfigError> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path)
                .map_err(|source| ConfigError::ReadFailed { path: config_path.clone(), source })?;
            Ok(toml::from_str(raw_string.as_str())?)
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            Ok(config)
        }
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &path::Path) -> Result<(), ConfigError> {
        let config_str: String = toml::to_string_pretty(self)?;
        let write_failed = |source| ConfigError::WriteFailed { path: path.to_path_buf(), source };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_failed)?;
        }

        fs::write(path, config_str).map_err(write_failed)
    }

    /// Apply `NETWATCH_DB_PATH`, `PING_*` and `APP_*` overrides from `lookup`
    pub fn apply_overrides(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        override_with(&mut self.database.path, lookup, "NETWATCH_DB_PATH", |v| {
            Some(v.to_string()).filter(|v| !v.is_empty())
        });
        override_with(&mut self.ping.enabled, lookup, "PING_ENABLED", parse_flag);
        override_with(&mut self.ping.interval_seconds, lookup, "PING_INTERVAL_SECONDS", |v| {
            v.trim().parse().ok()
        });
        override_with(&mut self.ping.timeout_ms, lookup, "PING_TIMEOUT_MS", |v| v.trim().parse().ok());
        override_with(&mut self.ping.concurrency, lookup, "PING_CONCURRENCY", |v| {
            v.trim().parse().ok()
        });
        override_with(&mut self.server.bind, lookup, "APP_BIND", |v| {
            Some(v.trim().to_string()).filter(|v| !v.is_empty())
        });
        override_with(&mut self.server.port, lookup, "APP_PORT", |v| v.trim().parse().ok());
    }

    /// Replace unusable values with working ones
    pub fn normalize(&mut self) {
        if self.ping.timeout_ms == 0 {
            warn!("Ping timeout of 0 ms is not usable; falling back to {DEFAULT_TIMEOUT_MS} ms");
            self.ping.timeout_ms = DEFAULT_TIMEOUT_MS;
        }
        if self.ping.concurrency == 0 {
            self.ping.concurrency = 1;
        }
        if self.database.pool_size == 0 {
            self.database.pool_size = 1;
        }
        if self.ping.enabled && self.ping.interval_seconds == 0 {
            warn!("Ping interval of 0 seconds disables the liveness scheduler");
        }
    }

    /// Whether the host should start the sweep scheduler
    pub fn scheduler_enabled(&self) -> bool {
        self.ping.enabled && self.ping.interval_seconds > 0
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            interval: Duration::from_secs(self.ping.interval_seconds),
            probe_timeout: Duration::from_millis(self.ping.timeout_ms),
            concurrency: self.ping.concurrency,
        }
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.ping.timeout_ms)
    }
}
