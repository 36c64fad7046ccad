//! Property tests for the framing layer.

mod support;

use proptest::prelude::*;

use strand::codec::{FramedRead, FramedWrite, LinesCodec};
use strand::prelude::*;

use support::MockIo;

proptest! {
    /// Any sequence of frames survives encode → byte channel → decode,
    /// whatever the chunk boundaries on the wire.
    #[test]
    fn lines_roundtrip_under_arbitrary_chunking(
        lines in proptest::collection::vec("[a-zA-Z0-9 ]{0,64}", 1..16),
        chunk in 1usize..48,
    ) {
        // Encode everything through the sink.
        let mut sink = FramedWrite::new(MockIo::new(), LinesCodec::new());
        for line in &lines {
            prop_assert!(sink.start_send(line.clone()).unwrap().is_ready());
        }
        prop_assert_eq!(sink.poll_complete().unwrap(), Async::Ready(()));
        let wire = sink.get_ref().unwrap().written.clone();

        // Replay the wire bytes in fixed-size chunks.
        let chunks: Vec<&[u8]> = wire.chunks(chunk).collect();
        let mut framed = FramedRead::new(MockIo::reading(&chunks), LinesCodec::new());
        let mut decoded = Vec::new();
        loop {
            match framed.poll().unwrap() {
                Async::Ready(Some(line)) => decoded.push(line),
                Async::Ready(None) => break,
                Async::NotReady => panic!("mock channel never suspends"),
            }
        }
        prop_assert_eq!(decoded, lines);
    }

    /// An unterminated tail after the last delimiter is still delivered,
    /// exactly once, when the channel half-closes.
    #[test]
    fn eof_tail_is_never_lost(tail in "[a-zA-Z0-9]{1,32}") {
        let mut wire = b"first\n".to_vec();
        wire.extend_from_slice(tail.as_bytes());
        let mut framed = FramedRead::new(MockIo::reading(&[&wire]), LinesCodec::new());
        prop_assert_eq!(framed.poll().unwrap(), Async::Ready(Some("first".to_string())));
        prop_assert_eq!(framed.poll().unwrap(), Async::Ready(Some(tail.clone())));
        prop_assert_eq!(framed.poll().unwrap(), Async::Ready(None));
    }
}
