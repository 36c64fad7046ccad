use crate::future::{Future, IntoFuture};
use crate::poll::Poll;

/// A future deferring construction of its inner future until first poll.
///
/// Created by [`lazy`]; useful for running a closure on the executor that
/// will eventually drive it, e.g. to reach
/// [`Handle::current`](crate::runtime::Handle::current).
pub struct Lazy<F, R: IntoFuture> {
    inner: Inner<F, R::Future>,
}

enum Inner<F, R> {
    Deferred(Option<F>),
    Running(R),
}

/// Creates a future from a closure producing a future, run on first poll.
pub fn lazy<F, R>(f: F) -> Lazy<F, R>
where
    F: FnOnce() -> R,
    R: IntoFuture,
{
    Lazy {
        inner: Inner::Deferred(Some(f)),
    }
}

impl<F, R> Future for Lazy<F, R>
where
    F: FnOnce() -> R,
    R: IntoFuture,
{
    type Item = R::Item;
    type Error = R::Error;

    fn poll(&mut self) -> Poll<R::Item, R::Error> {
        loop {
            let next = match self.inner {
                Inner::Deferred(ref mut f) => {
                    let f = f.take().expect("cannot poll Lazy twice");
                    Inner::Running(f().into_future())
                }
                Inner::Running(ref mut fut) => return fut.poll(),
            };
            self.inner = next;
        }
    }

    fn cancel(&mut self) {
        match self.inner {
            // Not started yet; the closure is simply never run.
            Inner::Deferred(ref mut f) => {
                f.take();
            }
            Inner::Running(ref mut fut) => fut.cancel(),
        }
    }
}
