//! TCP primitives driven by the reactor.

use std::fmt;
use std::io::{self, Read, Write};
use std::net::SocketAddr;

use crate::error::Error;
use crate::future::Future;
use crate::io::{AsyncRead, AsyncWrite, PollSource};
use crate::poll::{Async, Poll};
use crate::runtime::Handle;
use crate::stream::Stream;

/// A TCP socket listening for inbound connections.
pub struct TcpListener {
    io: PollSource<mio::net::TcpListener>,
    handle: Handle,
}

impl TcpListener {
    /// Binds to `addr` and registers with the reactor behind `handle`.
    pub fn bind(addr: &SocketAddr, handle: &Handle) -> io::Result<TcpListener> {
        let listener = mio::net::TcpListener::bind(*addr)?;
        Ok(TcpListener {
            io: PollSource::new(listener, handle)?,
            handle: handle.clone(),
        })
    }

    /// The local address the listener is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.io.get_ref().local_addr()
    }

    /// Accepts one inbound connection if one is pending.
    pub fn poll_accept(&mut self) -> Poll<(TcpStream, SocketAddr), Error> {
        if self.io.poll_read_ready().is_not_ready() {
            return Ok(Async::NotReady);
        }
        match self.io.get_ref().accept() {
            Ok((socket, addr)) => {
                let stream = TcpStream::from_mio(socket, &self.handle)
                    .map_err(|e| Error::io("accept", e))?;
                Ok(Async::Ready((stream, addr)))
            }
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                self.io.clear_read_ready();
                Ok(Async::NotReady)
            }
            Err(e) => Err(Error::io("accept", e)),
        }
    }

    /// Converts the listener into a stream of accepted connections.
    pub fn incoming(self) -> Incoming {
        Incoming { inner: self }
    }
}

impl fmt::Debug for TcpListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TcpListener")
            .field("addr", &self.io.get_ref().local_addr().ok())
            .finish()
    }
}

/// Stream of `(TcpStream, SocketAddr)` pairs produced by
/// [`TcpListener::incoming`]. Never ends on its own; drop it to stop
/// accepting.
pub struct Incoming {
    inner: TcpListener,
}

impl Stream for Incoming {
    type Item = (TcpStream, SocketAddr);
    type Error = Error;

    fn poll(&mut self) -> Poll<Option<(TcpStream, SocketAddr)>, Error> {
        let pair = try_ready!(self.inner.poll_accept());
        Ok(Async::Ready(Some(pair)))
    }
}

/// A connected, non-blocking TCP byte channel.
pub struct TcpStream {
    io: PollSource<mio::net::TcpStream>,
}

impl TcpStream {
    /// Opens a connection to `addr`; the returned future resolves once
    /// the socket is writable and the OS reports no pending error.
    pub fn connect(addr: &SocketAddr, handle: &Handle) -> ConnectFuture {
        let state = match mio::net::TcpStream::connect(*addr) {
            Ok(socket) => match TcpStream::from_mio(socket, handle) {
                Ok(stream) => ConnectState::Waiting(stream),
                Err(e) => ConnectState::Error(Error::io("connect", e)),
            },
            Err(e) => ConnectState::Error(Error::io("connect", e)),
        };
        ConnectFuture { state }
    }

    fn from_mio(socket: mio::net::TcpStream, handle: &Handle) -> io::Result<TcpStream> {
        Ok(TcpStream {
            io: PollSource::new(socket, handle)?,
        })
    }

    /// The remote peer's address.
    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.io.get_ref().peer_addr()
    }

    /// The local address of this socket.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.io.get_ref().local_addr()
    }

    /// Sets the `TCP_NODELAY` option.
    pub fn set_nodelay(&self, nodelay: bool) -> io::Result<()> {
        self.io.get_ref().set_nodelay(nodelay)
    }
}

impl Read for TcpStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.io.read(buf)
    }
}

impl Write for TcpStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.io.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.io.flush()
    }
}

impl AsyncRead for TcpStream {
    fn poll_read(&mut self) -> Async<()> {
        self.io.poll_read_ready()
    }
}

impl AsyncWrite for TcpStream {
    fn poll_write(&mut self) -> Async<()> {
        self.io.poll_write_ready()
    }
}

impl fmt::Debug for TcpStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TcpStream")
            .field("peer", &self.io.get_ref().peer_addr().ok())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::future;
    use crate::io::{recv, TransferAtLeast};
    use crate::runtime::Runtime;

    #[test]
    fn dropping_a_socket_releases_its_watcher() {
        let rt = Runtime::new().unwrap();
        let handle = rt.handle();
        let addr = "127.0.0.1:0".parse().unwrap();
        let listener = TcpListener::bind(&addr, &handle).unwrap();
        assert_eq!(rt.io_watcher_count(), 1);
        drop(listener);
        assert_eq!(rt.io_watcher_count(), 0);
    }

    #[test]
    fn cancelling_a_pending_read_unlinks_its_watcher() {
        let mut rt = Runtime::new().unwrap();
        let handle = rt.handle();
        let addr = "127.0.0.1:0".parse().unwrap();
        let listener = TcpListener::bind(&addr, &handle).unwrap();
        let bound = listener.local_addr().unwrap();
        rt.spawn(
            listener
                .incoming()
                .for_each(|(_socket, _peer)| Ok(()))
                .then(|_| Ok(())),
        );

        rt.block_on(future::lazy(move || {
            TcpStream::connect(&bound, &Handle::current()).and_then(|socket| {
                let mut read = recv(socket, TransferAtLeast::new(1));
                future::poll_fn(move || {
                    // The first poll arms the read watcher; nothing ever
                    // writes, so it stays pending.
                    match read.poll() {
                        Ok(Async::NotReady) => {}
                        _ => panic!("expected a pending read"),
                    }
                    let armed = Handle::current()
                        .driver(|d| d.io_watcher_count())
                        .unwrap();
                    read.cancel();
                    let released = Handle::current()
                        .driver(|d| d.io_watcher_count())
                        .unwrap();
                    assert_eq!(released, armed - 1);
                    Ok(Async::Ready(()))
                })
            })
        }))
        .unwrap();
    }
}

/// Future for [`TcpStream::connect`].
pub struct ConnectFuture {
    state: ConnectState,
}

enum ConnectState {
    Waiting(TcpStream),
    Error(Error),
    Done,
    Cancelled,
}

impl Future for ConnectFuture {
    type Item = TcpStream;
    type Error = Error;

    fn poll(&mut self) -> Poll<TcpStream, Error> {
        match std::mem::replace(&mut self.state, ConnectState::Done) {
            ConnectState::Waiting(stream) => {
                if stream.io.poll_write_ready().is_not_ready() {
                    self.state = ConnectState::Waiting(stream);
                    return Ok(Async::NotReady);
                }
                // Writability signals the handshake outcome; the socket
                // error slot says which.
                if let Some(e) = stream
                    .io
                    .get_ref()
                    .take_error()
                    .map_err(|e| Error::io("connect", e))?
                {
                    return Err(Error::io("connect", e));
                }
                Ok(Async::Ready(stream))
            }
            ConnectState::Error(e) => Err(e),
            ConnectState::Done => Err(Error::InvalidPollState),
            ConnectState::Cancelled => {
                self.state = ConnectState::Cancelled;
                Err(Error::Cancelled)
            }
        }
    }

    fn cancel(&mut self) {
        self.state = ConnectState::Cancelled;
    }
}
