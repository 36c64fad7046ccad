use std::io::Read;

use bytes::BytesMut;

use crate::error::Error;
use crate::future::Future;
use crate::io::AsyncRead;
use crate::poll::{Async, Poll};

/// Controls how much a [`recv`] future reads before resolving.
pub trait ReadPolicy {
    /// Total capacity to reserve for the transfer.
    fn buffer_size(&self) -> usize;
    /// How many more bytes may be read without overshooting the policy.
    fn remaining(&self) -> usize;
    /// Records `n` freshly read bytes; `true` once the policy is
    /// satisfied.
    fn advance(&mut self, n: usize) -> bool;
}

/// Read at least `length` bytes, buffering up to `buffer_size`.
#[derive(Debug, Clone)]
pub struct TransferAtLeast {
    length: usize,
    buffer_size: usize,
    read: usize,
}

impl TransferAtLeast {
    /// A policy reading at least `length` bytes into a buffer of twice
    /// that size.
    pub fn new(length: usize) -> TransferAtLeast {
        TransferAtLeast::with_buffer(length, length * 2)
    }

    /// A policy reading at least `length` bytes into a buffer of
    /// `buffer_size` bytes.
    pub fn with_buffer(length: usize, buffer_size: usize) -> TransferAtLeast {
        assert!(length > 0);
        assert!(buffer_size >= length);
        TransferAtLeast {
            length,
            buffer_size,
            read: 0,
        }
    }
}

impl ReadPolicy for TransferAtLeast {
    fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    fn remaining(&self) -> usize {
        self.buffer_size - self.read
    }

    fn advance(&mut self, n: usize) -> bool {
        self.read += n;
        self.read >= self.length
    }
}

/// Read exactly `length` bytes, never more.
#[derive(Debug, Clone)]
pub struct TransferExactly(TransferAtLeast);

impl TransferExactly {
    /// A policy reading exactly `length` bytes.
    pub fn new(length: usize) -> TransferExactly {
        TransferExactly(TransferAtLeast::with_buffer(length, length))
    }
}

impl ReadPolicy for TransferExactly {
    fn buffer_size(&self) -> usize {
        self.0.buffer_size()
    }

    fn remaining(&self) -> usize {
        self.0.remaining()
    }

    fn advance(&mut self, n: usize) -> bool {
        self.0.advance(n)
    }
}

/// Reads from `io` until `policy` is satisfied, resolving to the channel
/// and the bytes read.
pub fn recv<T, P>(io: T, policy: P) -> Recv<T, P>
where
    T: AsyncRead,
    P: ReadPolicy,
{
    let buf = BytesMut::with_capacity(policy.buffer_size());
    Recv {
        io: Some(io),
        policy,
        buf,
        state: State::Reading,
    }
}

/// Future for [`recv`].
pub struct Recv<T, P> {
    io: Option<T>,
    policy: P,
    buf: BytesMut,
    state: State,
}

#[derive(PartialEq)]
enum State {
    Reading,
    Done,
    Cancelled,
}

impl<T, P> Future for Recv<T, P>
where
    T: AsyncRead,
    P: ReadPolicy,
{
    type Item = (T, BytesMut);
    type Error = Error;

    fn poll(&mut self) -> Poll<(T, BytesMut), Error> {
        match self.state {
            State::Cancelled => return Err(Error::Cancelled),
            State::Done => return Err(Error::InvalidPollState),
            State::Reading => {}
        }
        loop {
            let start = self.buf.len();
            let want = self.policy.remaining();
            self.buf.resize(start + want, 0);
            let result = self.io.as_mut().unwrap().read(&mut self.buf[start..]);
            match result {
                Ok(0) => {
                    self.buf.truncate(start);
                    self.io = None;
                    return Err(Error::io(
                        "recv",
                        std::io::ErrorKind::UnexpectedEof.into(),
                    ));
                }
                Ok(n) => {
                    self.buf.truncate(start + n);
                    if self.policy.advance(n) {
                        self.state = State::Done;
                        let io = self.io.take().unwrap();
                        return Ok(Async::Ready((io, self.buf.split())));
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    self.buf.truncate(start);
                    return Ok(Async::NotReady);
                }
                Err(e) => {
                    self.buf.truncate(start);
                    self.io = None;
                    return Err(Error::io("recv", e));
                }
            }
        }
    }

    fn cancel(&mut self) {
        // Dropping the channel unlinks its watcher and wakes anything
        // parked on it.
        self.io = None;
        self.state = State::Cancelled;
    }
}
