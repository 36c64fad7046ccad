use crate::future::Future;
use crate::poll::{Async, Poll};

/// A future immediately resolved from a `Result`.
///
/// Created by [`result`], [`ok`] or [`err`].
pub struct FutureResult<T, E> {
    inner: Option<Result<T, E>>,
}

/// Creates a future that resolves to the given result on first poll.
pub fn result<T, E>(r: Result<T, E>) -> FutureResult<T, E> {
    FutureResult { inner: Some(r) }
}

/// Creates an immediately-successful future.
pub fn ok<T, E>(t: T) -> FutureResult<T, E> {
    result(Ok(t))
}

/// Creates an immediately-failed future.
pub fn err<T, E>(e: E) -> FutureResult<T, E> {
    result(Err(e))
}

impl<T, E> Future for FutureResult<T, E> {
    type Item = T;
    type Error = E;

    fn poll(&mut self) -> Poll<T, E> {
        self.inner
            .take()
            .expect("cannot poll FutureResult twice")
            .map(Async::Ready)
    }

    // The value is already here; there is nothing to release.
    fn cancel(&mut self) {}
}
