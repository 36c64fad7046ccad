use crate::poll::{Async, Poll};
use crate::stream::Stream;

/// Stream for [`Stream::map`].
pub struct Map<S, F> {
    stream: S,
    f: F,
}

impl<S, F> Map<S, F> {
    pub(crate) fn new(stream: S, f: F) -> Map<S, F> {
        Map { stream, f }
    }
}

impl<S, F, U> Stream for Map<S, F>
where
    S: Stream,
    F: FnMut(S::Item) -> U,
{
    type Item = U;
    type Error = S::Error;

    fn poll(&mut self) -> Poll<Option<U>, S::Error> {
        let item = try_ready!(self.stream.poll());
        Ok(Async::Ready(item.map(&mut self.f)))
    }
}
