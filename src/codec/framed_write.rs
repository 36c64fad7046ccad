use std::io::Write;

use bytes::{Buf, BytesMut};
use log::{debug, trace};

use crate::codec::Encoder;
use crate::error::Error;
use crate::io::AsyncWrite;
use crate::poll::{Async, Poll};
use crate::sink::{AsyncSink, Sink, StartSend};

/// Buffered bytes beyond which `start_send` starts pushing back.
const DEFAULT_HIGH_WATER_MARK: usize = 16 * 1024;

/// A back-pressured sink of frames encoded onto a byte channel.
///
/// Accepted frames accumulate in a write buffer; only
/// [`poll_complete`](Sink::poll_complete) moves bytes to the channel.
/// Once an I/O error has surfaced the channel is dropped and the sink is
/// poisoned: every later call reports [`Error::InvalidPollState`] rather
/// than pretending to make progress.
pub struct FramedWrite<T, E> {
    io: Option<T>,
    encoder: E,
    buffer: BytesMut,
    high_water_mark: usize,
}

impl<T, E> FramedWrite<T, E>
where
    T: AsyncWrite,
    E: Encoder,
{
    /// Wraps `io`, encoding frames with `encoder`.
    pub fn new(io: T, encoder: E) -> FramedWrite<T, E> {
        FramedWrite {
            io: Some(io),
            encoder,
            buffer: BytesMut::with_capacity(DEFAULT_HIGH_WATER_MARK),
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
        }
    }

    /// Replaces the backpressure boundary (default 16 KiB).
    pub fn with_high_water_mark(mut self, amount: usize) -> FramedWrite<T, E> {
        self.high_water_mark = amount;
        self
    }

    /// Returns a reference to the underlying channel, if it has not been
    /// dropped by an error.
    pub fn get_ref(&self) -> Option<&T> {
        self.io.as_ref()
    }

    /// Returns a mutable reference to the underlying channel.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.io.as_mut()
    }

    fn fail(&mut self, e: Error) -> Error {
        self.io = None;
        self.buffer = BytesMut::new();
        e
    }
}

impl<T, E> Sink for FramedWrite<T, E>
where
    T: AsyncWrite,
    E: Encoder,
{
    type SinkItem = E::Item;
    type SinkError = Error;

    fn start_send(&mut self, item: E::Item) -> StartSend<E::Item, Error> {
        if self.io.is_none() {
            return Err(Error::InvalidPollState);
        }

        if self.buffer.len() > self.high_water_mark {
            self.poll_complete()?;
            if self.buffer.len() > self.high_water_mark {
                debug!("write buffer still over the mark; frame rejected");
                return Ok(AsyncSink::NotReady(item));
            }
        }

        self.encoder.encode(item, &mut self.buffer)?;

        // Opportunistic flush. The frame is already accepted, so a
        // NotReady here is not reflected in the result; an error is.
        self.poll_complete()?;
        Ok(AsyncSink::Ready)
    }

    fn poll_complete(&mut self) -> Poll<(), Error> {
        let io = match self.io.as_mut() {
            Some(io) => io,
            None => return Err(Error::InvalidPollState),
        };
        trace!("flushing frames; {}B buffered", self.buffer.len());
        while !self.buffer.is_empty() {
            let result = io.write(&self.buffer);
            match result {
                Ok(0) => {
                    let e = Error::io("flush frame", std::io::ErrorKind::WriteZero.into());
                    return Err(self.fail(e));
                }
                Ok(n) => self.buffer.advance(n),
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    return Ok(Async::NotReady)
                }
                Err(e) => return Err(self.fail(Error::io("flush frame", e))),
            }
        }
        // Drained; `reserve` reclaims the consumed headroom before the
        // next encode.
        Ok(Async::Ready(()))
    }
}
