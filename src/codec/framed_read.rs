use std::io::Read;

use bytes::BytesMut;
use log::trace;

use crate::codec::Decoder;
use crate::error::Error;
use crate::io::AsyncRead;
use crate::poll::{Async, Poll};
use crate::stream::Stream;

/// How much spare tailroom each fill of the read buffer asks for.
const READ_RESERVE: usize = 16 * 1024;

/// A stream of frames decoded from a byte channel.
///
/// The lifetime is bound to the channel's: an I/O or decode error drops
/// the channel and the buffer, and later polls report
/// [`Error::InvalidPollState`]. A clean EOF keeps yielding
/// `Ready(None)`.
pub struct FramedRead<T, D> {
    io: Option<T>,
    decoder: D,
    buffer: BytesMut,
    eof: bool,
    readable: bool,
}

impl<T, D> FramedRead<T, D>
where
    T: AsyncRead,
    D: Decoder,
{
    /// Wraps `io`, decoding frames with `decoder`.
    pub fn new(io: T, decoder: D) -> FramedRead<T, D> {
        FramedRead {
            io: Some(io),
            decoder,
            buffer: BytesMut::with_capacity(READ_RESERVE),
            eof: false,
            readable: false,
        }
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

    /// Consumes the stream, returning the channel and any bytes read but
    /// not yet decoded.
    pub fn into_inner(self) -> (Option<T>, BytesMut) {
        (self.io, self.buffer)
    }

    fn fail(&mut self, e: Error) -> Error {
        self.io = None;
        self.buffer = BytesMut::new();
        e
    }
}

impl<T, D> Stream for FramedRead<T, D>
where
    T: AsyncRead,
    D: Decoder,
{
    type Item = D::Item;
    type Error = Error;

    fn poll(&mut self) -> Poll<Option<D::Item>, Error> {
        if self.io.is_none() {
            return Err(Error::InvalidPollState);
        }
        loop {
            // Loop invariant: `readable` holds iff the buffer may contain
            // a complete frame.
            if self.readable {
                if self.eof {
                    if self.buffer.is_empty() {
                        return Ok(Async::Ready(None));
                    }
                    let frame = match self.decoder.decode_eof(&mut self.buffer) {
                        Ok(frame) => frame,
                        Err(e) => return Err(self.fail(e)),
                    };
                    return Ok(Async::Ready(Some(frame)));
                }
                match self.decoder.decode(&mut self.buffer) {
                    Ok(Some(frame)) => return Ok(Async::Ready(Some(frame))),
                    Ok(None) => self.readable = false,
                    Err(e) => return Err(self.fail(e)),
                }
            }

            // Make sure there is uniquely-owned tailroom, then pull more
            // bytes off the channel.
            let start = self.buffer.len();
            self.buffer.resize(start + READ_RESERVE, 0);
            let result = self.io.as_mut().unwrap().read(&mut self.buffer[start..]);
            match result {
                Ok(0) => {
                    self.buffer.truncate(start);
                    trace!("framed read: eof");
                    self.eof = true;
                    self.readable = true;
                }
                Ok(n) => {
                    self.buffer.truncate(start + n);
                    self.readable = true;
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    self.buffer.truncate(start);
                    return Ok(Async::NotReady);
                }
                Err(e) => {
                    self.buffer.truncate(start);
                    return Err(self.fail(Error::io("read frame", e)));
                }
            }
        }
    }
}
