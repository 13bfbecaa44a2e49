mod file;
mod retry;

pub use file::{load, FileSequenceCounter, INITIAL_SEQUENCE};
pub use retry::{is_retryable_io_error, PersistRetryConfig};
