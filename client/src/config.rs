//! Client configuration loaded via OrthoConfig.
//!
//! Values come from `STRIDE_*` environment variables, CLI flags, or a config
//! file; accessors apply the defaults so callers never see a missing value.

use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::outbound::storage::CookiePolicy;

const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_COOKIE_MAX_AGE_HOURS: u64 = 24;
const SESSION_DIR_NAME: &str = ".stride";

/// Errors raised when configured values cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientSettingsError {
    /// The base URL does not parse or is not HTTP(S).
    #[error("invalid base url '{value}': {message}")]
    InvalidBaseUrl {
        /// Configured value.
        value: String,
        /// Why it was rejected.
        message: String,
    },
    /// The session directory is not valid UTF-8.
    #[error("session directory is not valid UTF-8: {path}")]
    NonUtf8SessionDir {
        /// Lossy rendering of the configured path.
        path: String,
    },
}

fn default_session_dir() -> PathBuf {
    std::env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map_or_else(|| PathBuf::from("."), PathBuf::from)
        .join(SESSION_DIR_NAME)
}

/// Configuration values for the API client and CLI.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "STRIDE")]
pub struct ClientSettings {
    /// Backend base URL; request paths are appended to it.
    pub base_url: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_seconds: Option<u64>,
    /// Directory holding the persistent session file.
    pub session_dir: Option<PathBuf>,
    /// Lifetime of mirrored session cookies, in hours.
    pub cookie_max_age_hours: Option<u64>,
}

impl ClientSettings {
    /// Validated base URL, falling back to the local development backend.
    ///
    /// # Errors
    ///
    /// Returns [`ClientSettingsError::InvalidBaseUrl`] when the value does not
    /// parse or uses a scheme other than `http`/`https`.
    pub fn base_url(&self) -> Result<Url, ClientSettingsError> {
        let raw = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let invalid = |message: String| ClientSettingsError::InvalidBaseUrl {
            value: raw.to_owned(),
            message,
        };
        let url = Url::parse(raw).map_err(|error| invalid(error.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(invalid(format!("unsupported scheme '{other}'"))),
        }
    }

    /// Request timeout, at least one second.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(
            self.timeout_seconds
                .unwrap_or(DEFAULT_TIMEOUT_SECONDS)
                .max(1),
        )
    }

    /// Session directory, defaulting to `$HOME/.stride` (or `./.stride`).
    ///
    /// # Errors
    ///
    /// Returns [`ClientSettingsError::NonUtf8SessionDir`] for non-UTF-8 paths.
    pub fn session_dir(&self) -> Result<Utf8PathBuf, ClientSettingsError> {
        let path = self
            .session_dir
            .clone()
            .unwrap_or_else(default_session_dir);
        Utf8PathBuf::from_path_buf(path).map_err(|path| ClientSettingsError::NonUtf8SessionDir {
            path: path.to_string_lossy().into_owned(),
        })
    }

    /// Cookie attributes for the session mirror.
    pub fn cookie_policy(&self) -> CookiePolicy {
        CookiePolicy::with_max_age_hours(
            self.cookie_max_age_hours
                .unwrap_or(DEFAULT_COOKIE_MAX_AGE_HOURS),
        )
    }
}
