use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::view::DEFAULT_ROWS_PER_PAGE;

pub const API_URL_ENV: &str = "TASKDESK_API_URL";
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("taskdesk")
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join("taskdesk")
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_rows_per_page() -> usize {
    DEFAULT_ROWS_PER_PAGE
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TaskdeskConfig {
    #[serde(default = "default_api_url")]
    pub api_base_url: String,
    #[serde(default = "default_rows_per_page")]
    pub rows_per_page: usize,
    #[serde(default)]
    pub debug_logging: bool,
    /// Where the session file lives; defaults to the user data directory.
    #[serde(default = "default_data_dir")]
    pub data_directory: PathBuf,
}

impl Default for TaskdeskConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_url(),
            rows_per_page: default_rows_per_page(),
            debug_logging: false,
            data_directory: default_data_dir(),
        }
    }
}

impl TaskdeskConfig {
    pub fn default_path() -> PathBuf {
        default_config_dir().join("config.json")
    }

    /// Load from `path`; a missing file gives the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `TASKDESK_API_URL` if set and non-empty.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api_base_url = url.trim().to_string();
            }
        }
        self
    }

    pub fn session_path(&self) -> PathBuf {
        self.data_directory.join("session.json")
    }
}
