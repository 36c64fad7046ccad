//! Request/response plumbing over framed transports.
//!
//! The server side couples a decoder stream, a [`Service`] and an encoder
//! sink into one future per connection ([`serve`]); the client side
//! multiplexes in-flight requests over a single connection in strict FIFO
//! order ([`pipeline`]). There are no correlation ids: the transport and
//! the peer are trusted to preserve request/response order.

use crate::error::Error;
use crate::future::Future;

mod client;
mod server;

pub use self::client::{pipeline, PipelineClient, PipelineTransport, ResponseFuture};
pub use self::server::{serve, Serve};

/// An asynchronous function from requests to responses.
///
/// Implementations may keep state across invocations; the orchestrators
/// impose nothing beyond the future contract. User errors travel as
/// [`Error::Service`](crate::Error::Service) or any other `Error` kind
/// the service chooses.
pub trait Service {
    /// The request type.
    type Request;
    /// The response type.
    type Response;
    /// The future returned by [`call`](Service::call).
    type Future: Future<Item = Self::Response, Error = Error>;

    /// Begins handling one request.
    fn call(&mut self, request: Self::Request) -> Self::Future;
}
