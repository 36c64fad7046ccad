use crate::future::{Future, IntoFuture};
use crate::poll::{Async, Poll};

/// Future for [`Future::then`], sequencing on either outcome.
pub struct Then<A, B: IntoFuture, F> {
    state: State<A, B::Future, F>,
}

enum State<A, B, F> {
    First(A, Option<F>),
    Second(B),
}

impl<A, B: IntoFuture, F> Then<A, B, F> {
    pub(crate) fn new(future: A, f: F) -> Then<A, B, F> {
        Then {
            state: State::First(future, Some(f)),
        }
    }
}

impl<A, B, F> Future for Then<A, B, F>
where
    A: Future,
    B: IntoFuture,
    F: FnOnce(Result<A::Item, A::Error>) -> B,
{
    type Item = B::Item;
    type Error = B::Error;

    fn poll(&mut self) -> Poll<B::Item, B::Error> {
        loop {
            let next = match self.state {
                State::First(ref mut a, ref mut f) => {
                    let outcome = match a.poll() {
                        Ok(Async::NotReady) => return Ok(Async::NotReady),
                        Ok(Async::Ready(item)) => Ok(item),
                        Err(e) => Err(e),
                    };
                    let f = f.take().expect("cannot poll Then twice");
                    State::Second(f(outcome).into_future())
                }
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
