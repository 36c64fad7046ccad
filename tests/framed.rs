//! Framed stream and sink behavior over a scripted channel.

mod support;

use std::io;

use strand::codec::{FramedRead, FramedWrite, LinesCodec};
use strand::prelude::*;
use strand::sink::AsyncSink;
use strand::Error;

use support::MockIo;

fn drain<T: AsyncRead>(framed: &mut FramedRead<T, LinesCodec>) -> Vec<String> {
    let mut out = Vec::new();
    loop {
        match framed.poll().unwrap() {
            Async::Ready(Some(line)) => out.push(line),
            Async::Ready(None) => return out,
            Async::NotReady => panic!("mock channel never suspends"),
        }
    }
}

#[test]
fn frames_survive_arbitrary_chunk_boundaries() {
    let mock = MockIo::reading(&[b"he", b"llo\nwo", b"rld\n"]);
    let mut framed = FramedRead::new(mock, LinesCodec::new());
    assert_eq!(drain(&mut framed), vec!["hello", "world"]);
}

#[test]
fn eof_with_trailing_frame_yields_it_then_ends() {
    let mock = MockIo::reading(&[b"partial"]);
    let mut framed = FramedRead::new(mock, LinesCodec::new());
    assert_eq!(drain(&mut framed), vec!["partial"]);
    // A finished stream keeps reporting end-of-stream.
    assert_eq!(framed.poll().unwrap(), Async::Ready(None));
}

struct Counting {
    inner: LinesCodec,
    eof_calls: std::rc::Rc<std::cell::Cell<usize>>,
}

impl strand::codec::Decoder for Counting {
    type Item = String;
    fn decode(&mut self, buf: &mut bytes::BytesMut) -> Result<Option<String>, Error> {
        self.inner.decode(buf)
    }
    fn decode_eof(&mut self, buf: &mut bytes::BytesMut) -> Result<String, Error> {
        self.eof_calls.set(self.eof_calls.get() + 1);
        self.inner.decode_eof(buf)
    }
}

#[test]
fn eof_with_empty_buffer_skips_decode_eof() {
    let eof_calls = std::rc::Rc::new(std::cell::Cell::new(0));
    let mock = MockIo::reading(&[b"whole\n"]);
    let mut framed = FramedRead::new(
        mock,
        Counting {
            inner: LinesCodec::new(),
            eof_calls: eof_calls.clone(),
        },
    );
    assert_eq!(framed.poll().unwrap(), Async::Ready(Some("whole".to_string())));
    assert_eq!(framed.poll().unwrap(), Async::Ready(None));
    assert_eq!(eof_calls.get(), 0);
}

#[test]
fn eof_with_pending_bytes_runs_decode_eof_once() {
    let eof_calls = std::rc::Rc::new(std::cell::Cell::new(0));
    let mock = MockIo::reading(&[b"tail"]);
    let mut framed = FramedRead::new(
        mock,
        Counting {
            inner: LinesCodec::new(),
            eof_calls: eof_calls.clone(),
        },
    );
    assert_eq!(framed.poll().unwrap(), Async::Ready(Some("tail".to_string())));
    assert_eq!(framed.poll().unwrap(), Async::Ready(None));
    assert_eq!(eof_calls.get(), 1);
}

#[test]
fn read_error_poisons_the_stream() {
    struct FailingRead;
    impl io::Read for FailingRead {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::ErrorKind::ConnectionReset.into())
        }
    }
    impl AsyncRead for FailingRead {
        fn poll_read(&mut self) -> Async<()> {
            Async::Ready(())
        }
    }

    let mut framed = FramedRead::new(FailingRead, LinesCodec::new());
    match framed.poll() {
        Err(Error::Io { op, .. }) => assert_eq!(op, "read frame"),
        other => panic!("expected io error, got {:?}", other.map(|_| ())),
    }
    assert!(matches!(framed.poll(), Err(Error::InvalidPollState)));
}

#[test]
fn accepted_items_are_buffered_until_flush() {
    let mock = MockIo::new();
    let mut sink = FramedWrite::new(mock, LinesCodec::new());
    assert!(sink.start_send("one".to_string()).unwrap().is_ready());
    assert!(sink.start_send("two".to_string()).unwrap().is_ready());
    assert_eq!(sink.poll_complete().unwrap(), Async::Ready(()));
    assert_eq!(&sink.get_ref().unwrap().written[..], b"one\ntwo\n");
}

#[test]
fn backpressure_begins_near_the_high_water_mark() {
    let mut mock = MockIo::new();
    // Nothing drains: every flush would block.
    mock.write_limit = Some(0);
    let mut sink = FramedWrite::new(mock, LinesCodec::new());

    let line = "x".repeat(1024);
    let mut accepted = 0usize;
    let mut rejected = None;
    for i in 0..64 {
        match sink.start_send(line.clone()).unwrap() {
            AsyncSink::Ready => accepted += 1,
            AsyncSink::NotReady(item) => {
                assert_eq!(item, line);
                rejected = Some(i);
                break;
            }
        }
    }
    let rejected = rejected.expect("sink never pushed back");
    // 16 KiB of 1025-byte frames: the first offer after the mark is the
    // one handed back.
    assert_eq!(rejected, accepted);
    let buffered = accepted * (line.len() + 1);
    assert!(buffered > 16 * 1024);
    assert!(buffered < 18 * 1024);
}

#[test]
fn flush_on_an_empty_buffer_is_a_no_op() {
    let mock = MockIo::new();
    let mut sink = FramedWrite::new(mock, LinesCodec::new());
    assert_eq!(sink.poll_complete().unwrap(), Async::Ready(()));
    assert_eq!(sink.poll_complete().unwrap(), Async::Ready(()));
    assert_eq!(sink.get_ref().unwrap().write_calls, 0);
}

#[test]
fn write_error_poisons_the_sink() {
    let mut mock = MockIo::new();
    mock.fail_next_write = Some(io::ErrorKind::ConnectionReset);
    let mut sink = FramedWrite::new(mock, LinesCodec::new());

    // The opportunistic flush inside start_send surfaces the failure.
    match sink.start_send("doomed".to_string()) {
        Err(Error::Io { op, .. }) => assert_eq!(op, "flush frame"),
        other => panic!("expected io error, got {:?}", other.map(|_| ())),
    }
    // After an error has surfaced once, later calls must not pretend to
    // succeed.
    assert!(matches!(sink.poll_complete(), Err(Error::InvalidPollState)));
    assert!(matches!(
        sink.start_send("more".to_string()),
        Err(Error::InvalidPollState)
    ));
}

#[test]
fn partial_writes_trim_the_buffer_head() {
    let mut mock = MockIo::new();
    mock.write_limit = Some(5);
    let mut sink = FramedWrite::new(mock, LinesCodec::new());
    assert!(sink.start_send("abcdefgh".to_string()).unwrap().is_ready());
    // Five bytes drained, the rest parked in the buffer.
    assert_eq!(sink.poll_complete().unwrap(), Async::NotReady);
    assert_eq!(&sink.get_ref().unwrap().written[..], b"abcde");
    // The channel opens up; the remainder follows.
    sink.get_mut().unwrap().write_limit = None;
    assert_eq!(sink.poll_complete().unwrap(), Async::Ready(()));
    assert_eq!(&sink.get_ref().unwrap().written[..], b"abcdefgh\n");
}
