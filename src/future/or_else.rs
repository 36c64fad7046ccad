use crate::future::{Future, IntoFuture};
use crate::poll::{Async, Poll};

/// Future for [`Future::or_else`].
pub struct OrElse<A, B: IntoFuture, F> {
    state: State<A, B::Future, F>,
}

enum State<A, B, F> {
    First(A, Option<F>),
    Second(B),
}

impl<A, B: IntoFuture, F> OrElse<A, B, F> {
    pub(crate) fn new(future: A, f: F) -> OrElse<A, B, F> {
        OrElse {
            state: State::First(future, Some(f)),
        }
    }
}

impl<A, B, F> Future for OrElse<A, B, F>
where
    A: Future,
    B: IntoFuture<Item = A::Item>,
    F: FnOnce(A::Error) -> B,
{
    type Item = A::Item;
    type Error = B::Error;

    fn poll(&mut self) -> Poll<A::Item, B::Error> {
        loop {
            let next = match self.state {
                State::First(ref mut a, ref mut f) => match a.poll() {
                    Ok(Async::NotReady) => return Ok(Async::NotReady),
                    Ok(Async::Ready(item)) => return Ok(Async::Ready(item)),
                    Err(e) => {
                        let f = f.take().expect("cannot poll OrElse twice");
                        State::Second(f(e).into_future())
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
