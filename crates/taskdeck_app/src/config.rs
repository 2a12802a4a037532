use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use taskdeck_engine::{Account, BackendError, BackendSettings};
use taskdeck_logging::{LogDestination, DEFAULT_LOG_FILE};
use thiserror::Error;
use url::Url;

pub(crate) const DEFAULT_CONFIG_FILE: &str = "taskdeck.ron";

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("invalid auth url {0:?}")]
    AuthUrl(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct BackendConfig {
    pub base_url: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            connect_timeout_secs: 6,
            request_timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub backend: BackendConfig,
    pub auth_url: String,
    pub poll_interval_secs: u64,
    pub log_to_file: bool,
    pub log_to_terminal: bool,
    pub accounts: Vec<Account>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            auth_url: "http://127.0.0.1:8080/auth/signin".to_string(),
            poll_interval_secs: 30,
            log_to_file: false,
            log_to_terminal: true,
            accounts: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn backend_settings(&self) -> Result<BackendSettings, ConfigError> {
        let mut settings = BackendSettings::parse(&self.backend.base_url)?;
        settings.connect_timeout = Duration::from_secs(self.backend.connect_timeout_secs);
        settings.request_timeout = Duration::from_secs(self.backend.request_timeout_secs);
        Ok(settings)
    }

    pub fn auth_endpoint(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.auth_url).map_err(|_| ConfigError::AuthUrl(self.auth_url.clone()))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Falls back to the terminal when both outputs are switched off.
    pub fn log_destination(&self) -> LogDestination {
        let file = PathBuf::from(DEFAULT_LOG_FILE);
        match (self.log_to_file, self.log_to_terminal) {
            (true, true) => LogDestination::Both(file),
            (true, false) => LogDestination::File(file),
            (false, _) => LogDestination::Terminal,
        }
    }
}

/// Reads the config at `path`. `Ok(None)` when the file does not exist.
pub(crate) fn load(path: &Path) -> Result<Option<AppConfig>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    ron::from_str(&content)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}
