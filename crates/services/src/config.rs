use std::env;
use std::path::PathBuf;

use crate::error::ConfigError;

pub const DEFAULT_DB_URL: &str = "sqlite://tutor.sqlite3";
pub const DEFAULT_MESSAGE_CAP: u32 = 500;

/// Resolved runtime configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TutorConfig {
    pub db_url: String,
    /// JSON catalog to load; the bundled sample catalog is used when `None`.
    pub catalog_path: Option<PathBuf>,
    /// Completion endpoint; the tutor chat is disabled when `None`.
    pub chat_url: Option<String>,
    pub message_cap: u32,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            db_url: DEFAULT_DB_URL.into(),
            catalog_path: None,
            chat_url: None,
            message_cap: DEFAULT_MESSAGE_CAP,
        }
    }
}

impl TutorConfig {
    /// Read `TUTOR_*` variables from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, reading values through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a numeric variable does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let message_cap = match non_blank("TUTOR_MESSAGE_CAP") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "TUTOR_MESSAGE_CAP",
                value: raw,
            })?,
            None => DEFAULT_MESSAGE_CAP,
        };

        Ok(Self {
            db_url: non_blank("TUTOR_DB_URL").unwrap_or_else(|| DEFAULT_DB_URL.into()),
            catalog_path: non_blank("TUTOR_CATALOG").map(PathBuf::from),
            chat_url: non_blank("TUTOR_CHAT_URL"),
            message_cap,
        })
    }
}
