use std::mem;

use crate::future::Future;
use crate::poll::{Async, Poll};
use crate::stream::Stream;

/// Future for [`Stream::collect`].
pub struct Collect<S: Stream> {
    stream: S,
    items: Vec<S::Item>,
}

impl<S: Stream> Collect<S> {
    pub(crate) fn new(stream: S) -> Collect<S> {
        Collect {
            stream,
            items: Vec::new(),
        }
    }
}

impl<S: Stream> Future for Collect<S> {
    type Item = Vec<S::Item>;
    type Error = S::Error;

    fn poll(&mut self) -> Poll<Vec<S::Item>, S::Error> {
        loop {
            match try_ready!(self.stream.poll()) {
                Some(item) => self.items.push(item),
                None => return Ok(Async::Ready(mem::replace(&mut self.items, Vec::new()))),
            }
        }
    }
}
