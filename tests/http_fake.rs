//! A fake HTTP exchange over the pipelined client, with a test-local
//! minimal HTTP/1 codec (real protocol codecs live outside the engine;
//! the codec contract is the boundary exercised here).

use bytes::{BufMut, BytesMut};

use strand::codec::{Decoder, Encoder, FramedRead, FramedWrite};
use strand::future;
use strand::net::{TcpListener, TcpStream};
use strand::prelude::*;
use strand::rpc;
use strand::runtime::{Handle, Runtime};
use strand::Error;

#[derive(Debug, PartialEq)]
struct Response {
    status: u16,
    body: Vec<u8>,
}

struct Request {
    path: String,
}

struct ResponseDecoder;

impl Decoder for ResponseDecoder {
    type Item = Response;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Response>, Error> {
        let header_end = match find(buf, b"\r\n\r\n") {
            Some(pos) => pos,
            None => return Ok(None),
        };
        let head = std::str::from_utf8(&buf[..header_end])
            .map_err(|_| Error::Codec("response head is not utf-8".into()))?;
        let mut lines = head.split("\r\n");
        let status_line = lines.next().unwrap_or("");
        let status: u16 = status_line
            .split_whitespace()
            .nth(1)
            .and_then(|code| code.parse().ok())
            .ok_or_else(|| Error::Codec("malformed status line".into()))?;
        let content_length: usize = lines
            .filter_map(|line| {
                let mut parts = line.splitn(2, ':');
                let name = parts.next()?.trim();
                let value = parts.next()?.trim();
                if name.eq_ignore_ascii_case("content-length") {
                    value.parse().ok()
                } else {
                    None
                }
            })
            .next()
            .ok_or_else(|| Error::Codec("missing content-length".into()))?;

        let total = header_end + 4 + content_length;
        if buf.len() < total {
            return Ok(None);
        }
        let frame = buf.split_to(total);
        Ok(Some(Response {
            status,
            body: frame[header_end + 4..].to_vec(),
        }))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Response, Error> {
        match self.decode(buf)? {
            Some(response) => Ok(response),
            None => Err(Error::Codec("truncated response".into())),
        }
    }
}

struct RequestEncoder;

impl Encoder for RequestEncoder {
    type Item = Request;

    fn encode(&mut self, item: Request, buf: &mut BytesMut) -> Result<(), Error> {
        buf.reserve(item.path.len() + 64);
        buf.put_slice(b"GET ");
        buf.put_slice(item.path.as_bytes());
        buf.put_slice(b" HTTP/1.1\r\nHost: localhost\r\n\r\n");
        Ok(())
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[test]
fn get_against_a_canned_server_yields_status_and_body() {
    const CANNED: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nTESTX";

    let mut rt = Runtime::new().unwrap();
    let addr = "127.0.0.1:0".parse().unwrap();
    let listener = TcpListener::bind(&addr, &rt.handle()).unwrap();
    let bound = listener.local_addr().unwrap();

    // The fake server answers every connection with one canned response
    // and hangs up.
    rt.spawn(
        listener
            .incoming()
            .for_each(|(socket, _peer)| {
                Handle::current().spawn(
                    strand::io::send(socket, CANNED).then(|_| Ok(())),
                );
                Ok(())
            })
            .then(|_| Ok(())),
    );

    let response = rt
        .block_on(future::lazy(move || {
            TcpStream::connect(&bound, &Handle::current()).and_then(|socket| {
                let (rd, wr) = socket.split();
                let (client, transport) = rpc::pipeline(
                    FramedRead::new(rd, ResponseDecoder),
                    FramedWrite::new(wr, RequestEncoder),
                );
                Handle::current().spawn(transport.then(|_| Ok(())));
                let call = client.call(Request {
                    path: "/".to_string(),
                });
                client.close();
                call
            })
        }))
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, b"TESTX".to_vec());
}
