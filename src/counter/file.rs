use std::fs::File;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use backon::BlockingRetryable;

use super::retry::{is_retryable_io_error, PersistRetryConfig};
use crate::contracts::{LockResultExt, SequenceCounter, SequenceError};

/// First value handed out by a fresh or unreadable store.
pub const INITIAL_SEQUENCE: u64 = 1;

/// Mutex-guarded sequence counter backed by a one-line text file.
///
/// The store holds the next value to dispense as a decimal ASCII integer
/// and nothing else. Every mutation writes the store before the in-memory
/// value moves and before the lock is released, so the store never lags
/// behind what has been handed out. A crash after the write but before the
/// caller uses its number leaves a gap; numbers are never issued twice
/// unless the filesystem loses an acknowledged write.
pub struct FileSequenceCounter {
    value: Mutex<u64>,
    persistence_path: Option<PathBuf>,
    retry: PersistRetryConfig,
}

impl FileSequenceCounter {
    /// Creates a counter that lives only in memory, starting at 1.
    pub fn in_memory() -> Self {
        Self::starting_from(INITIAL_SEQUENCE)
    }

    /// Creates an in-memory counter starting from a specific value.
    /// Values below 1 are raised to 1.
    pub fn starting_from(value: u64) -> Self {
        Self {
            value: Mutex::new(value.max(INITIAL_SEQUENCE)),
            persistence_path: None,
            retry: PersistRetryConfig::default(),
        }
    }

    /// Opens a counter persisted at `path`, resuming from the stored value.
    ///
    /// Never fails: a missing or corrupt store resumes at 1.
    pub fn with_persistence(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let initial = load(&path);
        tracing::info!(path = %path.display(), next = initial, "Sequence counter loaded");
        Self {
            value: Mutex::new(initial),
            persistence_path: Some(path),
            retry: PersistRetryConfig::default(),
        }
    }

    /// Replaces the persistence retry policy.
    pub fn with_retry(mut self, retry: PersistRetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.persistence_path.as_deref()
    }

    /// Persists `new_value`, then publishes it to `slot`.
    /// On failure `slot` keeps its previous value.
    fn commit(&self, slot: &mut u64, new_value: u64) -> Result<(), SequenceError> {
        if let Some(ref path) = self.persistence_path {
            persist(path, new_value, &self.retry)?;
        }
        *slot = new_value;
        Ok(())
    }
}

impl SequenceCounter for FileSequenceCounter {
    fn next(&self) -> Result<u64, SequenceError> {
        let mut value = self.value.lock().map_lock_err()?;
        let dispensed = *value;
        let following = dispensed.checked_add(1).ok_or(SequenceError::Overflow)?;
        self.commit(&mut value, following)?;
        tracing::debug!(sequence = dispensed, "Dispensed sequence number");
        Ok(dispensed)
    }

    fn current(&self) -> Result<u64, SequenceError> {
        Ok(*self.value.lock().map_lock_err()?)
    }

    fn reset(&self) -> Result<u64, SequenceError> {
        let mut value = self.value.lock().map_lock_err()?;
        self.commit(&mut value, INITIAL_SEQUENCE)?;
        tracing::info!("Sequence counter reset to {}", INITIAL_SEQUENCE);
        Ok(INITIAL_SEQUENCE)
    }

    fn set(&self, new_value: i64) -> Result<u64, SequenceError> {
        if new_value < INITIAL_SEQUENCE as i64 {
            return Err(SequenceError::InvalidArgument(format!(
                "sequence must be at least {}, got {}",
                INITIAL_SEQUENCE, new_value
            )));
        }
        let new_value = new_value as u64;
        let mut value = self.value.lock().map_lock_err()?;
        self.commit(&mut value, new_value)?;
        tracing::info!(next = new_value, "Sequence counter set");
        Ok(new_value)
    }
}

/// Reads the next value from the store at `path`.
///
/// Returns 1 when the file is missing, unreadable, not an integer, or not
/// positive. Restarting at 1 on corruption is accepted data loss; it is
/// logged, never raised.
pub fn load(path: &Path) -> u64 {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No sequence store, starting at 1");
            return INITIAL_SEQUENCE;
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Unreadable sequence store, starting at 1");
            return INITIAL_SEQUENCE;
        }
    };

    match contents.trim().parse::<u64>() {
        Ok(value) if value >= INITIAL_SEQUENCE => value,
        _ => {
            tracing::warn!(
                path = %path.display(),
                contents = %contents.trim(),
                "Corrupt sequence store, starting at 1"
            );
            INITIAL_SEQUENCE
        }
    }
}

fn persist(path: &Path, value: u64, retry: &PersistRetryConfig) -> Result<(), SequenceError> {
    (|| write_atomic(path, value))
        .retry(retry.backoff())
        .sleep(std::thread::sleep)
        .when(is_retryable_io_error)
        .notify(|err: &std::io::Error, dur: Duration| {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                retry_in = ?dur,
                "Sequence store write failed, retrying"
            );
        })
        .call()
        .map_err(|e| {
            tracing::error!(path = %path.display(), value, error = %e, "Failed to persist sequence");
            SequenceError::PersistFailed(format!("{}: {}", path.display(), e))
        })
}

/// Writes `value` to a sibling temp file and renames it over `path`, so a
/// reader never sees a partially written store.
fn write_atomic(path: &Path, value: u64) -> std::io::Result<()> {
    let tmp = temp_path(path);
    {
        let mut file = File::create(&tmp)?;
        file.write_all(value.to_string().as_bytes())?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp, path)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "sequence".into());
    name.push(".tmp");
    path.with_file_name(name)
}
