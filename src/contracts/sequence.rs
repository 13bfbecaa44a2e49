use crate::contracts::error::SequenceError;

/// Hands out caption sequence numbers.
///
/// # Invariants
/// - No two calls to `next()` return the same value, even across threads
/// - The stored value is always the smallest number not yet dispensed
/// - Survives process restart; a missing or corrupt store resumes at 1
/// - `next()`, `reset()` and `set()` are mutually exclusive
pub trait SequenceCounter: Send + Sync {
    /// Returns the next sequence number and durably advances the counter.
    ///
    /// On a persistence failure nothing is dispensed and the counter keeps
    /// its previous value.
    fn next(&self) -> Result<u64, SequenceError>;

    /// Returns the value `next()` would hand out, without consuming it.
    fn current(&self) -> Result<u64, SequenceError>;

    /// Restarts numbering at 1. Returns the new value.
    fn reset(&self) -> Result<u64, SequenceError>;

    /// Sets the next value to hand out. Values below 1 are rejected with
    /// `SequenceError::InvalidArgument` and leave the counter unchanged.
    fn set(&self, value: i64) -> Result<u64, SequenceError>;
}
