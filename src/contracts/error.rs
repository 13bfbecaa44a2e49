use std::sync::{MutexGuard, PoisonError};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptionerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Sequence error: {0}")]
    Sequence(#[from] SequenceError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Extension trait for converting lock errors to SequenceError.
pub trait LockResultExt<T> {
    /// Converts a lock error to a SequenceError.
    fn map_lock_err(self) -> Result<T, SequenceError>;
}

impl<'a, T> LockResultExt<MutexGuard<'a, T>>
    for Result<MutexGuard<'a, T>, PoisonError<MutexGuard<'a, T>>>
{
    #[inline]
    fn map_lock_err(self) -> Result<MutexGuard<'a, T>, SequenceError> {
        self.map_err(|e| SequenceError::LockPoisoned(e.to_string()))
    }
}

#[derive(Error, Debug)]
pub enum SequenceError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to persist sequence: {0}")]
    PersistFailed(String),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("Sequence overflow")]
    Overflow,
}

/// Startup configuration problems. Never raised per message.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required value: {0}")]
    Missing(String),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: String, reason: String },

    #[error("Failed to read config file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Rejected by transport: {0}")]
    Rejected(String),

    #[error("Transport unavailable: {0}")]
    Unavailable(String),
}
