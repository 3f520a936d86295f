use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::platform::{OsAliases, TargetPlatform};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub const API_URL_VAR: &str = "PP_API_URL";
pub const TIMEOUT_VAR: &str = "PP_HTTP_TIMEOUT_SECS";
pub const OS_VAR: &str = "PP_OS";
pub const ARCH_VAR: &str = "PP_ARCH";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a positive number of seconds, got {value:?}")]
    InvalidTimeout { var: &'static str, value: String },

    #[error("{var} is set but empty")]
    EmptyValue { var: &'static str },
}

/// Everything a run needs besides the `owner/repo` pair.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the release API, without a trailing slash.
    pub api_base: String,
    pub timeout: Duration,
    pub target: TargetPlatform,
    pub aliases: OsAliases,
    /// Directory the archive is downloaded to and the binary installed in.
    pub install_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            target: TargetPlatform::host(),
            aliases: OsAliases::default(),
            install_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Defaults overridden by the `PP_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = non_empty(API_URL_VAR, lookup(API_URL_VAR))? {
            config.api_base = url.trim_end_matches('/').to_string();
        }

        if let Some(raw) = non_empty(TIMEOUT_VAR, lookup(TIMEOUT_VAR))? {
            config.timeout = parse_timeout(&raw)?;
        }

        if let Some(os) = non_empty(OS_VAR, lookup(OS_VAR))? {
            config.target.os = os;
        }

        if let Some(arch) = non_empty(ARCH_VAR, lookup(ARCH_VAR))? {
            config.target.arch = arch;
        }

        Ok(config)
    }
}

fn non_empty(var: &'static str, value: Option<String>) -> Result<Option<String>, ConfigError> {
    match value {
        Some(v) if v.trim().is_empty() => Err(ConfigError::EmptyValue { var }),
        other => Ok(other),
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidTimeout {
            var: TIMEOUT_VAR,
            value: raw.to_string(),
        }),
    }
}
