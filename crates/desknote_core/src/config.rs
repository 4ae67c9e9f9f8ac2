//! Application configuration.
//!
//! # Responsibility
//! - Resolve default storage/log locations from XDG directories.
//! - Load optional overrides from `<config_dir>/desktop-notes/config.json`.
//!
//! # Invariants
//! - A missing config file is not an error; defaults apply.
//! - Unknown keys are ignored, missing keys take defaults.

use crate::logging::default_log_level;
use crate::model::note::NoteStyle;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const APP_DIR_NAME: &str = "desktop-notes";
const CONFIG_FILE_NAME: &str = "config.json";
const DB_FILE_NAME: &str = "notes.db";
const LOG_DIR_NAME: &str = "logs";
pub const DEFAULT_EDITOR_COMMAND: &str = "kate {filepath}";
pub const DEFAULT_CHANGE_RETENTION_DAYS: u32 = 7;

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
        }
    }
}

/// Runtime configuration shared by hosts and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub db_path: PathBuf,
    /// Must be absolute; see `logging::init_logging`.
    pub log_dir: PathBuf,
    pub log_level: String,
    /// `{filepath}` is replaced by the note path; otherwise the path is appended.
    pub editor_command: String,
    /// Style given to notes created by `request-new-note` or first launch.
    pub default_style: NoteStyle,
    /// Change log entries older than this are pruned when a context opens.
    /// 0 keeps them forever.
    pub change_retention_days: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = data_dir();
        Self {
            db_path: data_dir.join(DB_FILE_NAME),
            log_dir: data_dir.join(LOG_DIR_NAME),
            log_level: default_log_level().to_string(),
            editor_command: DEFAULT_EDITOR_COMMAND.to_string(),
            default_style: NoteStyle::default(),
            change_retention_days: DEFAULT_CHANGE_RETENTION_DAYS,
        }
    }
}

impl AppConfig {
    /// Loads config from the default location, falling back to defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load(default_config_path())
    }

    /// Loads config from `path`; a missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            default_style: config.default_style.clamped(),
            ..config
        })
    }
}

/// `$XDG_CONFIG_HOME/desktop-notes/config.json` or the platform equivalent.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(fallback_base_dir)
        .join(APP_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(fallback_base_dir)
        .join(APP_DIR_NAME)
}

fn fallback_base_dir() -> PathBuf {
    std::env::temp_dir()
}
