//! Back-pressured consumers of values.

use crate::poll::Poll;

/// Outcome of [`Sink::start_send`]: the item was accepted, or the sink is
/// full and hands the item back for a later retry.
#[derive(Debug, PartialEq)]
pub enum AsyncSink<T> {
    /// The item was accepted and is now owned by the sink (it may sit in
    /// an internal buffer until [`Sink::poll_complete`] drains it).
    Ready,
    /// The sink is at capacity. The item is returned; the caller must
    /// retry after the sink has made progress. The current task has been
    /// parked for a wakeup.
    NotReady(T),
}

impl<T> AsyncSink<T> {
    /// Returns whether the item was accepted.
    pub fn is_ready(&self) -> bool {
        match *self {
            AsyncSink::Ready => true,
            AsyncSink::NotReady(_) => false,
        }
    }
}

/// Return type of [`Sink::start_send`].
pub type StartSend<T, E> = Result<AsyncSink<T>, E>;

/// A destination for values, applying backpressure to producers.
///
/// An accepted item may reside in an internal buffer; only
/// [`poll_complete`](Sink::poll_complete) moves bytes toward the
/// underlying channel, and it must be polled until it returns `Ready` for
/// the sink to be considered flushed.
pub trait Sink {
    /// The items this sink accepts.
    type SinkItem;
    /// The error the sink may fail with.
    type SinkError;

    /// Offers an item to the sink.
    fn start_send(&mut self, item: Self::SinkItem)
        -> StartSend<Self::SinkItem, Self::SinkError>;

    /// Drives buffered items toward the underlying channel. Idempotent:
    /// on an empty buffer this returns `Ready` without side effects.
    fn poll_complete(&mut self) -> Poll<(), Self::SinkError>;

    /// Flushes any remaining output and shuts the sink down.
    fn close(&mut self) -> Poll<(), Self::SinkError> {
        self.poll_complete()
    }
}
