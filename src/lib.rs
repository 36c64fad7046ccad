#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]
#![doc(html_root_url = "https://docs.rs/strand/0.1.3")]

//! An event-driven, non-blocking I/O engine for writing asynchronous
//! clients and servers.
//!
//! The crate is layered bottom-up:
//!
//! * the reactor translates OS readiness for descriptors, timers and
//!   signals into task wakeups (internal; reached through the runtime).
//! * [`runtime`] is a single-threaded cooperative executor: a FIFO queue
//!   of ready tasks plus the reactor. Parallelism comes from running one
//!   runtime per OS thread.
//! * [`future`], [`stream`] and [`sink`] define the polling contract and
//!   its combinators.
//! * [`io`] provides byte channels: non-blocking descriptors with
//!   `poll_read`/`poll_write` hooks into the reactor.
//! * [`codec`] layers framed streams and sinks over byte channels, with
//!   backpressure.
//! * [`rpc`] holds the server orchestrator and the FIFO-pipelined
//!   client.
//!
//! # Example
//!
//! A line-echo server and a pipelined client sharing one runtime:
//!
//! ```no_run
//! use strand::codec::{FramedRead, FramedWrite, LinesCodec};
//! use strand::net::TcpListener;
//! use strand::prelude::*;
//! use strand::rpc;
//! use strand::runtime::{Handle, Runtime};
//!
//! struct Echo;
//!
//! impl rpc::Service for Echo {
//!     type Request = String;
//!     type Response = String;
//!     type Future = strand::future::FutureResult<String, strand::Error>;
//!
//!     fn call(&mut self, line: String) -> Self::Future {
//!         strand::future::ok(line)
//!     }
//! }
//!
//! let mut rt = Runtime::new().unwrap();
//! let addr = "127.0.0.1:8011".parse().unwrap();
//! let listener = TcpListener::bind(&addr, &rt.handle()).unwrap();
//! let server = listener.incoming().for_each(|(socket, _peer)| {
//!     let (rd, wr) = socket.split();
//!     Handle::current().spawn(rpc::serve(
//!         FramedRead::new(rd, LinesCodec::new()),
//!         Echo,
//!         FramedWrite::new(wr, LinesCodec::new()),
//!     ));
//!     Ok(())
//! });
//! rt.spawn(server);
//! rt.run().unwrap();
//! ```

#[macro_use]
mod macros;

mod error;
mod poll;

mod reactor;

pub mod codec;
pub mod future;
pub mod io;
pub mod net;
pub mod rpc;
pub mod runtime;
#[cfg(unix)]
pub mod signal;
pub mod sink;
pub mod stream;
pub mod sync;
pub mod task;
pub mod time;

pub use crate::error::Error;
pub use crate::poll::{Async, Poll};

pub mod prelude {
    //! The traits a consumer of this crate almost always needs in scope.

    pub use crate::future::{Future, IntoFuture};
    pub use crate::io::{AsyncRead, AsyncWrite, Io};
    pub use crate::sink::Sink;
    pub use crate::stream::Stream;
    pub use crate::{Async, Poll};
}
