use crate::future::{Future, IntoFuture};
use crate::poll::{Async, Poll};
use crate::stream::Stream;

/// Future for [`Stream::for_each`].
pub struct ForEach<S, F, U: IntoFuture> {
    stream: S,
    f: F,
    in_progress: Option<U::Future>,
}

impl<S, F, U: IntoFuture> ForEach<S, F, U> {
    pub(crate) fn new(stream: S, f: F) -> ForEach<S, F, U> {
        ForEach {
            stream,
            f,
            in_progress: None,
        }
    }
}

impl<S, F, U> Future for ForEach<S, F, U>
where
    S: Stream,
    F: FnMut(S::Item) -> U,
    U: IntoFuture<Item = (), Error = S::Error>,
{
    type Item = ();
    type Error = S::Error;

    fn poll(&mut self) -> Poll<(), S::Error> {
        loop {
            if let Some(mut fut) = self.in_progress.take() {
                match fut.poll()? {
                    Async::Ready(()) => {}
                    Async::NotReady => {
                        self.in_progress = Some(fut);
                        return Ok(Async::NotReady);
                    }
                }
            }
            match try_ready!(self.stream.poll()) {
                Some(item) => self.in_progress = Some((self.f)(item).into_future()),
                None => return Ok(Async::Ready(())),
            }
        }
    }

    fn cancel(&mut self) {
        if let Some(ref mut fut) = self.in_progress {
            fut.cancel();
        }
    }
}
