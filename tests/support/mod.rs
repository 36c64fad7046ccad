//! A scripted in-memory byte channel for exercising the framed layers
//! without a reactor. It is always "ready": reads serve the scripted
//! chunks then report EOF, and writes accept bytes up to an optional
//! limit, returning `WouldBlock` beyond it.

// Not every test binary uses every knob.
#![allow(dead_code)]

use std::cmp;
use std::collections::VecDeque;
use std::io::{self, Read, Write};

use strand::io::{AsyncRead, AsyncWrite};
use strand::Async;

pub struct MockIo {
    pub reads: VecDeque<Vec<u8>>,
    pub written: Vec<u8>,
    pub write_limit: Option<usize>,
    pub fail_next_write: Option<io::ErrorKind>,
    pub write_calls: usize,
}

impl MockIo {
    pub fn new() -> MockIo {
        MockIo {
            reads: VecDeque::new(),
            written: Vec::new(),
            write_limit: None,
            fail_next_write: None,
            write_calls: 0,
        }
    }

    pub fn reading(chunks: &[&[u8]]) -> MockIo {
        let mut mock = MockIo::new();
        mock.reads = chunks.iter().map(|c| c.to_vec()).collect();
        mock
    }
}

impl Read for MockIo {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.reads.pop_front() {
            None => Ok(0),
            Some(mut chunk) => {
                let n = cmp::min(buf.len(), chunk.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                if n < chunk.len() {
                    let rest = chunk.split_off(n);
                    self.reads.push_front(rest);
                }
                Ok(n)
            }
        }
    }
}

impl Write for MockIo {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_calls += 1;
        if let Some(kind) = self.fail_next_write.take() {
            return Err(kind.into());
        }
        let n = match self.write_limit {
            Some(limit) => cmp::min(buf.len(), limit.saturating_sub(self.written.len())),
            None => buf.len(),
        };
        if n == 0 && !buf.is_empty() {
            return Err(io::ErrorKind::WouldBlock.into());
        }
        self.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl AsyncRead for MockIo {
    fn poll_read(&mut self) -> Async<()> {
        Async::Ready(())
    }
}

impl AsyncWrite for MockIo {
    fn poll_write(&mut self) -> Async<()> {
        Async::Ready(())
    }
}
