//! Client configuration: defaults, an optional TOML file, and environment
//! variables. Command-line flags are layered on top by the binaries.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::types::{KillMode, ResetOptions};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_POLL_MS: u64 = 2500;
pub const DEFAULT_RETRY_MS: u64 = 3500;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{0}")]
    Invalid(String),
}

/// Resolved settings for talking to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub base_url: String,
    /// Delay between polls after a successful, non-final status.
    pub poll_interval: Duration,
    /// Delay before the next poll after a network failure.
    pub retry_interval: Duration,
    pub request_timeout: Duration,
    /// Flags sent with `POST /admin/reset` when the user cancels.
    pub reset: ResetOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_MS),
            retry_interval: Duration::from_millis(DEFAULT_RETRY_MS),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            reset: ResetOptions::default(),
        }
    }
}

/// On-disk shape of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub url: Option<String>,
    pub poll_ms: Option<u64>,
    pub retry_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub reset: Option<ResetOptions>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&text)?)
    }
}

impl Config {
    /// `<config dir>/zerohr/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("zerohr").join("config.toml"))
    }

    /// Defaults, then the config file, then environment variables.
    ///
    /// An explicit `path` must exist; the default location is only read if present.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        match path {
            Some(p) => config.apply_file(ConfigFile::load(p)?),
            None => {
                if let Some(p) = Self::default_path().filter(|p| p.exists()) {
                    log::debug!("loading config from {}", p.display());
                    config.apply_file(ConfigFile::load(&p)?);
                }
            }
        }

        config.apply_env();
        Ok(config)
    }

    pub fn apply_file(&mut self, file: ConfigFile) {
        if let Some(url) = file.url {
            self.base_url = url;
        }
        if let Some(ms) = file.poll_ms {
            self.poll_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = file.retry_ms {
            self.retry_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = file.timeout_secs {
            self.request_timeout = Duration::from_secs(secs);
        }
        if let Some(reset) = file.reset {
            self.reset = reset;
        }
    }

    /// Overlay `ZEROHR_*` variables from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Overlay variables from an arbitrary lookup. Unparseable values are
    /// logged and ignored.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("ZEROHR_URL").filter(|u| !u.trim().is_empty()) {
            self.base_url = url;
        }
        if let Some(ms) = parse_var(&lookup, "ZEROHR_POLL_MS") {
            self.poll_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var(&lookup, "ZEROHR_RETRY_MS") {
            self.retry_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_var(&lookup, "ZEROHR_TIMEOUT") {
            self.request_timeout = Duration::from_secs(secs);
        }
        if let Some(mode) = lookup("ZEROHR_KILL_MODE") {
            match mode.parse::<KillMode>() {
                Ok(m) => self.reset.kill_mode = m,
                Err(e) => log::warn!("ignoring ZEROHR_KILL_MODE: {e}"),
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "backend URL must start with http:// or https:// (got '{}')",
                self.base_url
            )));
        }
        if self.poll_interval.is_zero() || self.retry_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "poll and retry intervals must be greater than zero".into(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid("request timeout must be greater than zero".into()));
        }
        if let Some(map) = &self.reset.status_map {
            if let Some(bad) = map.keys().find(|k| k.trim().parse::<u32>().is_err()) {
                return Err(ConfigError::Invalid(format!(
                    "reset.status_map keys must be section numbers (got '{bad}')"
                )));
            }
        }
        Ok(())
    }
}

fn parse_var(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("ignoring {key}={raw:?}: not a non-negative integer");
            None
        }
    }
}
