use crate::future::Future;
use crate::poll::Poll;

/// Future backed by a closure returning `Poll`.
///
/// Created by [`poll_fn`].
pub struct PollFn<F> {
    inner: F,
}

/// Wraps a polling closure as a future.
pub fn poll_fn<T, E, F>(f: F) -> PollFn<F>
where
    F: FnMut() -> Poll<T, E>,
{
    PollFn { inner: f }
}

impl<T, E, F> Future for PollFn<F>
where
    F: FnMut() -> Poll<T, E>,
{
    type Item = T;
    type Error = E;

    fn poll(&mut self) -> Poll<T, E> {
        (self.inner)()
    }
}
