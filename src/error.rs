//! The error type shared across the engine.

use std::io;
use std::rc::Rc;

/// Errors produced by the runtime, the transport layers and the RPC
/// orchestrators.
///
/// The type is cheaply clonable so that a single connection failure can be
/// delivered to every pending response promise on a pipelined client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// An OS-level I/O failure, tagged with the operation that hit it.
    #[error("{op}: {cause}")]
    Io {
        /// The operation that failed, e.g. `"read frame"`.
        op: &'static str,
        /// The underlying OS error.
        cause: Rc<io::Error>,
    },

    /// A malformed frame was encountered while encoding or decoding.
    #[error("codec: {0}")]
    Codec(String),

    /// The future was cancelled by its caller or by composition.
    #[error("future cancelled")]
    Cancelled,

    /// A future, stream or sink was polled after reaching a terminal
    /// state. This is a programming error, reported distinctly from
    /// business errors.
    #[error("polled after completion")]
    InvalidPollState,

    /// A timeout elapsed before the wrapped future completed.
    #[error("deadline elapsed")]
    Elapsed,

    /// An error raised by a user service, passed through unchanged.
    #[error("service: {0}")]
    Service(Rc<dyn std::error::Error>),
}

impl Error {
    /// Wraps an `io::Error` with an operation tag.
    pub fn io(op: &'static str, cause: io::Error) -> Error {
        Error::Io {
            op,
            cause: Rc::new(cause),
        }
    }

    /// Wraps an arbitrary user error as a service error.
    pub fn service<E>(cause: E) -> Error
    where
        E: std::error::Error + 'static,
    {
        Error::Service(Rc::new(cause))
    }

    /// The `io::ErrorKind` of the underlying OS error, if this is an I/O
    /// error.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Error::Io { cause, .. } => Some(cause.kind()),
            _ => None,
        }
    }

    /// Returns whether this error is `Cancelled`.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Error {
        Error::io("io", e)
    }
}
