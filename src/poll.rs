//! The polling contract shared by futures, streams and sinks.

/// Return type of `Future::poll` and `Stream::poll`, indicating whether a
/// value is ready or whether the current task has been scheduled to receive
/// a wakeup before it should poll again.
///
/// The `NotReady` variant carries a contract: whoever returned it has
/// already parked the current task against some source of a future wakeup
/// (a reactor watcher, a timer, another future). Returning `NotReady`
/// without doing so stalls the task forever.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Async<T> {
    /// The value is immediately available.
    Ready(T),
    /// The value is not ready yet; the current task will be unparked when
    /// it may be.
    NotReady,
}

impl<T> Async<T> {
    /// Maps the inner value with `f`, preserving `NotReady`.
    pub fn map<U, F>(self, f: F) -> Async<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Async::Ready(t) => Async::Ready(f(t)),
            Async::NotReady => Async::NotReady,
        }
    }

    /// Returns whether this is `Async::Ready`.
    pub fn is_ready(&self) -> bool {
        match *self {
            Async::Ready(_) => true,
            Async::NotReady => false,
        }
    }

    /// Returns whether this is `Async::NotReady`.
    pub fn is_not_ready(&self) -> bool {
        !self.is_ready()
    }
}

impl<T> From<T> for Async<T> {
    fn from(t: T) -> Async<T> {
        Async::Ready(t)
    }
}

/// The result of a single poll: ready with a value, suspended, or failed.
pub type Poll<T, E> = Result<Async<T>, E>;
