//! Framing: applying a codec to a byte channel to expose typed items.
//!
//! A codec is a [`Decoder`]/[`Encoder`] pair over an in-type and an
//! out-type. [`FramedRead`] applies the decoder to a readable channel and
//! yields a [`Stream`](crate::stream::Stream) of frames; [`FramedWrite`]
//! applies the encoder to a writable channel and exposes a back-pressured
//! [`Sink`](crate::sink::Sink). Frame semantics (length prefixes,
//! delimiters, full protocols) are entirely codec-private.

use bytes::BytesMut;

use crate::error::Error;

mod framed_read;
mod framed_write;
mod lines;

pub use self::framed_read::FramedRead;
pub use self::framed_write::FramedWrite;
pub use self::lines::LinesCodec;

/// Decoding half of a codec: byte buffer in, frames out.
pub trait Decoder {
    /// The frame type produced.
    type Item;

    /// Attempts to pull one frame out of `buf`, consuming the bytes it
    /// uses. `Ok(None)` means more bytes are needed; the framed stream
    /// will read and retry. A decoder needing a larger buffer may
    /// `reserve` on it directly.
    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Error>;

    /// Produces a final frame from the bytes remaining when the channel
    /// reached EOF. Called only while `buf` is non-empty; the
    /// implementation must consume what it takes, and the remainder (if
    /// any) is offered to `decode_eof` again on the next poll.
    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Self::Item, Error>;
}

/// Encoding half of a codec: frames in, byte buffer out.
pub trait Encoder {
    /// The frame type consumed.
    type Item;

    /// Appends the encoded representation of `item` to `buf`.
    fn encode(&mut self, item: Self::Item, buf: &mut BytesMut) -> Result<(), Error>;
}
