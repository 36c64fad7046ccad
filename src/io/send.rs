use std::io::Write;

use bytes::Bytes;

use crate::error::Error;
use crate::future::Future;
use crate::io::AsyncWrite;
use crate::poll::{Async, Poll};

/// Writes `buf` to `io` once, resolving to the channel and the number of
/// bytes accepted by the single successful write.
pub fn send<T, B>(io: T, buf: B) -> Send<T>
where
    T: AsyncWrite,
    B: Into<Bytes>,
{
    Send {
        io: Some(io),
        buf: buf.into(),
        state: State::Init,
    }
}

/// Future for [`send`].
pub struct Send<T> {
    io: Option<T>,
    buf: Bytes,
    state: State,
}

#[derive(PartialEq)]
enum State {
    Init,
    Sent,
    Cancelled,
}

impl<T> Future for Send<T>
where
    T: AsyncWrite,
{
    type Item = (T, usize);
    type Error = Error;

    fn poll(&mut self) -> Poll<(T, usize), Error> {
        match self.state {
            State::Cancelled => return Err(Error::Cancelled),
            State::Sent => return Err(Error::InvalidPollState),
            State::Init => {}
        }
        let result = self.io.as_mut().unwrap().write(&self.buf);
        match result {
            Ok(0) if !self.buf.is_empty() => {
                self.io = None;
                Err(Error::io("send", std::io::ErrorKind::WriteZero.into()))
            }
            Ok(n) => {
                self.state = State::Sent;
                let io = self.io.take().unwrap();
                Ok(Async::Ready((io, n)))
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(Async::NotReady),
            Err(e) => {
                self.io = None;
                Err(Error::io("send", e))
            }
        }
    }

    fn cancel(&mut self) {
        self.io = None;
        self.state = State::Cancelled;
    }
}
