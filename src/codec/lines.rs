use bytes::{BufMut, BytesMut};

use crate::codec::{Decoder, Encoder};
use crate::error::Error;

/// A codec for `\n`-delimited UTF-8 frames.
///
/// Decoded lines have the terminator (and a preceding `\r`, if any)
/// stripped; at EOF an unterminated tail is yielded as a final frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinesCodec;

impl LinesCodec {
    /// Creates a new line codec.
    pub fn new() -> LinesCodec {
        LinesCodec
    }
}

fn utf8(buf: BytesMut) -> Result<String, Error> {
    String::from_utf8(buf.to_vec()).map_err(|_| Error::Codec("line is not valid utf-8".into()))
}

fn strip_carriage_return(mut line: BytesMut) -> BytesMut {
    if line.last() == Some(&b'\r') {
        line.truncate(line.len() - 1);
    }
    line
}

impl Decoder for LinesCodec {
    type Item = String;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<String>, Error> {
        match memchr::memchr(b'\n', buf) {
            Some(pos) => {
                let mut line = buf.split_to(pos + 1);
                line.truncate(pos);
                utf8(strip_carriage_return(line)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<String, Error> {
        match self.decode(buf)? {
            Some(line) => Ok(line),
            None => {
                let tail = buf.split();
                utf8(strip_carriage_return(tail))
            }
        }
    }
}

impl Encoder for LinesCodec {
    type Item = String;

    fn encode(&mut self, item: String, buf: &mut BytesMut) -> Result<(), Error> {
        buf.reserve(item.len() + 1);
        buf.put_slice(item.as_bytes());
        buf.put_u8(b'\n');
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_complete_lines() {
        let mut codec = LinesCodec::new();
        let mut buf = BytesMut::from(&b"hello\nwor"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("hello".to_string()));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(b"ld\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("world".to_string()));
        assert!(buf.is_empty());
    }

    #[test]
    fn eof_yields_unterminated_tail() {
        let mut codec = LinesCodec::new();
        let mut buf = BytesMut::from(&b"partial"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), "partial");
        assert!(buf.is_empty());
    }

    #[test]
    fn rejects_invalid_utf8() {
        let mut codec = LinesCodec::new();
        let mut buf = BytesMut::from(&b"\xff\xfe\n"[..]);
        assert!(codec.decode(&mut buf).is_err());
    }

    #[test]
    fn encodes_with_terminator() {
        let mut codec = LinesCodec::new();
        let mut buf = BytesMut::new();
        codec.encode("ping".to_string(), &mut buf).unwrap();
        assert_eq!(&buf[..], b"ping\n");
    }
}
