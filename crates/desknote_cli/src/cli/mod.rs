mod commands;
mod handlers;

use desknote_core::external::PickError;
use desknote_core::{ConfigError, StoreError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use commands::{Cli, Commands};
pub use handlers::{
    handle_add, handle_changes, handle_delete, handle_list, handle_move, handle_resize,
    handle_set_status, handle_style, handle_toggle, open_context,
};

#[derive(Debug)]
pub enum CliError {
    Config(ConfigError),
    Store(StoreError),
    File(PickError),
    Json(serde_json::Error),
    Invalid(String),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::File(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "json output failed: {err}"),
            Self::Invalid(message) => write!(f, "{message}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::File(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<StoreError> for CliError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<PickError> for CliError {
    fn from(value: PickError) -> Self {
        Self::File(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
