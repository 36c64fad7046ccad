//! Lazy asynchronous sequences.
//!
//! A [`Stream`] is the many-valued sibling of
//! [`Future`](crate::future::Future): each poll yields the next item,
//! `Ready(None)` signalling the end of the sequence.

use crate::poll::Poll;

mod collect;
mod for_each;
mod iter;
mod map;

pub use self::collect::Collect;
pub use self::for_each::ForEach;
pub use self::iter::{iter_ok, IterOk};
pub use self::map::Map;

use crate::future::IntoFuture;

/// An owned, type-erased stream.
pub type BoxStream<T, E> = Box<dyn Stream<Item = T, Error = E>>;

/// A lazily-evaluated sequence of values produced over time.
pub trait Stream {
    /// The items yielded by this stream.
    type Item;
    /// The error the stream may fail with.
    type Error;

    /// Attempts to pull the next item. `Ready(None)` is end-of-stream;
    /// `NotReady` means the current task has been parked for a wakeup.
    fn poll(&mut self) -> Poll<Option<Self::Item>, Self::Error>;

    /// Maps every item with `f`.
    fn map<U, F>(self, f: F) -> Map<Self, F>
    where
        F: FnMut(Self::Item) -> U,
        Self: Sized,
    {
        Map::new(self, f)
    }

    /// Runs `f` for each item, folding the stream into a
    /// `Future<Item = ()>` that resolves when the stream ends.
    ///
    /// Each future returned by `f` is driven to completion before the
    /// next item is pulled.
    fn for_each<F, U>(self, f: F) -> ForEach<Self, F, U>
    where
        F: FnMut(Self::Item) -> U,
        U: IntoFuture<Item = (), Error = Self::Error>,
        Self: Sized,
    {
        ForEach::new(self, f)
    }

    /// Collects every item into a `Vec`, resolving at end-of-stream.
    fn collect(self) -> Collect<Self>
    where
        Self: Sized,
    {
        Collect::new(self)
    }

    /// Erases the concrete type behind a boxed handle.
    fn boxed(self) -> BoxStream<Self::Item, Self::Error>
    where
        Self: Sized + 'static,
    {
        Box::new(self)
    }
}

impl<S: Stream + ?Sized> Stream for Box<S> {
    type Item = S::Item;
    type Error = S::Error;

    fn poll(&mut self) -> Poll<Option<Self::Item>, Self::Error> {
        (**self).poll()
    }
}
