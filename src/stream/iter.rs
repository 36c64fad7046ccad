use std::marker::PhantomData;

use crate::poll::{Async, Poll};
use crate::stream::Stream;

/// Stream yielding the items of an iterator, never failing.
///
/// Created by [`iter_ok`]; every item is immediately ready.
pub struct IterOk<I, E> {
    iter: I,
    _marker: PhantomData<E>,
}

/// Converts an iterator into an infallible stream.
pub fn iter_ok<I, E>(i: I) -> IterOk<I::IntoIter, E>
where
    I: IntoIterator,
{
    IterOk {
        iter: i.into_iter(),
        _marker: PhantomData,
    }
}

impl<I, E> Stream for IterOk<I, E>
where
    I: Iterator,
{
    type Item = I::Item;
    type Error = E;

    fn poll(&mut self) -> Poll<Option<I::Item>, E> {
        Ok(Async::Ready(self.iter.next()))
    }
}
