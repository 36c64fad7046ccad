use crate::future::Future;
use crate::poll::{Async, Poll};

/// Future for [`Future::map`].
pub struct Map<A, F> {
    future: A,
    f: Option<F>,
}

impl<A, F> Map<A, F> {
    pub(crate) fn new(future: A, f: F) -> Map<A, F> {
        Map { future, f: Some(f) }
    }
}

impl<A, F, U> Future for Map<A, F>
where
    A: Future,
    F: FnOnce(A::Item) -> U,
{
    type Item = U;
    type Error = A::Error;

    fn poll(&mut self) -> Poll<U, A::Error> {
        let item = try_ready!(self.future.poll());
        let f = self.f.take().expect("cannot poll Map twice");
        Ok(Async::Ready(f(item)))
    }

    fn cancel(&mut self) {
        self.future.cancel();
    }
}
