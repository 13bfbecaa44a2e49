pub mod error;
pub mod sequence;
pub mod transport;

pub use error::{CaptionerError, ConfigError, LockResultExt, SequenceError, TransportError};
pub use sequence::SequenceCounter;
pub use transport::{CaptionTransport, MediaKind, MediaMessage};
