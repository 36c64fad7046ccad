use crate::future::{Future, IntoFuture};
use crate::poll::{Async, Poll};

/// Future for [`Future::and_then`].
pub struct AndThen<A, B: IntoFuture, F> {
    state: State<A, B::Future, F>,
}

enum State<A, B, F> {
    First(A, Option<F>),
    Second(B),
}

impl<A, B: IntoFuture, F> AndThen<A, B, F> {
    pub(crate) fn new(future: A, f: F) -> AndThen<A, B, F> {
        AndThen {
            state: State::First(future, Some(f)),
        }
    }
}

impl<A, B, F> Future for AndThen<A, B, F>
where
    A: Future,
    B: IntoFuture<Error = A::Error>,
    F: FnOnce(A::Item) -> B,
{
    type Item = B::Item;
    type Error = A::Error;

    fn poll(&mut self) -> Poll<B::Item, A::Error> {
        loop {
            let next = match self.state {
                State::First(ref mut a, ref mut f) => match a.poll()? {
                    Async::NotReady => return Ok(Async::NotReady),
                    Async::Ready(item) => {
                        let f = f.take().expect("cannot poll AndThen twice");
                        State::Second(f(item).into_future())
                    }
                },
                State::Second(ref mut b) => return b.poll(),
            };
            self.state = next;
        }
    }

    fn cancel(&mut self) {
        match self.state {
            State::First(ref mut a, _) => a.cancel(),
            State::Second(ref mut b) => b.cancel(),
        }
    }
}
