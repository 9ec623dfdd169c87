//! Driven port for raw token persistence backends.
//!
//! A backend is a fallible key/value slot store. The session layer above it
//! decides which failures are swallowed; backends report every failure.

use crate::domain::TokenKey;

use super::define_port_error;

define_port_error! {
    /// Errors raised by token storage backends.
    pub enum TokenStorageError {
        /// The backend cannot be used at all (disabled, not initialised).
        Unavailable { message: String } =>
            "token storage unavailable: {message}",
        /// Reading or writing the backing medium failed.
        Io { message: String } =>
            "token storage i/o failed: {message}",
        /// Persisted data exists but cannot be interpreted.
        Corrupt { message: String } =>
            "token storage corrupt: {message}",
    }
}

/// Port for one token persistence backend.
#[cfg_attr(test, mockall::automock)]
pub trait TokenStorage: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn read(&self, key: TokenKey) -> Result<Option<String>, TokenStorageError>;

    /// Replace the value stored under `key`.
    fn write(&self, key: TokenKey, value: &str) -> Result<(), TokenStorageError>;

    /// Remove `key`; removing an absent key succeeds.
    fn remove(&self, key: TokenKey) -> Result<(), TokenStorageError>;
}
