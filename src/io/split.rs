use std::cell::RefCell;
use std::io::{self, Read, Write};
use std::rc::Rc;

use crate::io::{AsyncRead, AsyncWrite, Io};
use crate::poll::Async;

/// Splits a channel into read and write halves sharing ownership.
///
/// The halves alias the channel through an uncontended `RefCell`: the
/// executor is single-threaded and each half is used by at most one task,
/// so borrows never overlap. The channel itself (and its reactor watcher)
/// is released when both halves are gone.
pub fn split<T: Io>(io: T) -> (ReadHalf<T>, WriteHalf<T>) {
    let inner = Rc::new(RefCell::new(io));
    (
        ReadHalf {
            inner: inner.clone(),
        },
        WriteHalf { inner },
    )
}

/// The readable half of a split channel.
pub struct ReadHalf<T> {
    inner: Rc<RefCell<T>>,
}

/// The writable half of a split channel.
pub struct WriteHalf<T> {
    inner: Rc<RefCell<T>>,
}

impl<T: Io> Read for ReadHalf<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.borrow_mut().read(buf)
    }
}

impl<T: Io> AsyncRead for ReadHalf<T> {
    fn poll_read(&mut self) -> Async<()> {
        self.inner.borrow_mut().poll_read()
    }
}

impl<T: Io> Write for WriteHalf<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.borrow_mut().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.borrow_mut().flush()
    }
}

impl<T: Io> AsyncWrite for WriteHalf<T> {
    fn poll_write(&mut self) -> Async<()> {
        self.inner.borrow_mut().poll_write()
    }
}
