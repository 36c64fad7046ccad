//! Byte channels: non-blocking descriptors bridged into the task model.
//!
//! The traits here define the transport contract consumed by the framed
//! layers: [`AsyncRead`]/[`AsyncWrite`] extend the std `Read`/`Write`
//! traits with the readiness hooks that arrange wakeups, and [`Io`] ties
//! both directions together on a single channel.
//!
//! Conventions, which every channel implementation must uphold:
//!
//! * `read`/`write` returning `Err(WouldBlock)` means the object is not
//!   currently ready **and the current task has been scheduled to be
//!   woken** when it may be; the caller simply returns `NotReady`.
//! * `read` returning `Ok(0)` (with a non-empty buffer) means the peer
//!   has shut down its half of the connection.

use std::io::{Read, Write};

use crate::poll::Async;

mod poll_source;
mod recv;
mod send;
mod split;

pub use self::poll_source::PollSource;
pub use self::recv::{recv, Recv, ReadPolicy, TransferAtLeast, TransferExactly};
pub use self::send::{send, Send};
pub use self::split::{split, ReadHalf, WriteHalf};

/// A non-blocking readable channel wired into the reactor.
pub trait AsyncRead: Read {
    /// Tests for read readiness. `NotReady` parks the current task
    /// against the channel's read watcher.
    fn poll_read(&mut self) -> Async<()>;
}

/// A non-blocking writable channel wired into the reactor.
pub trait AsyncWrite: Write {
    /// Tests for write readiness. `NotReady` parks the current task
    /// against the channel's write watcher.
    fn poll_write(&mut self) -> Async<()>;
}

/// A bidirectional byte channel.
pub trait Io: AsyncRead + AsyncWrite {
    /// Splits the channel into independently owned read and write
    /// halves, so a framed stream and a framed sink can share one
    /// connection.
    fn split(self) -> (ReadHalf<Self>, WriteHalf<Self>)
    where
        Self: Sized,
    {
        split::split(self)
    }
}

impl<T: AsyncRead + AsyncWrite> Io for T {}
