use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;

use log::{debug, trace};

use crate::error::Error;
use crate::future::Future;
use crate::poll::{Async, Poll};
use crate::sink::{AsyncSink, Sink};
use crate::stream::Stream;
use crate::sync::oneshot;
use crate::task::{self, Task};

/// Builds a pipelining RPC client over one connection.
///
/// Returns the user-facing dispatcher and the transport future; the
/// caller spawns the transport onto the executor that owns the
/// connection. Requests are sent in call order and responses are matched
/// to calls by position, so the peer must answer in order.
pub fn pipeline<St, Si>(
    stream: St,
    sink: Si,
) -> (
    PipelineClient<Si::SinkItem, St::Item>,
    PipelineTransport<St, Si>,
)
where
    St: Stream<Error = Error>,
    Si: Sink<SinkError = Error>,
{
    let shared = Rc::new(RefCell::new(Shared {
        pending: VecDeque::new(),
        transport: None,
        closed: false,
        failed: None,
    }));
    (
        PipelineClient {
            shared: shared.clone(),
        },
        PipelineTransport {
            stream,
            sink,
            shared,
        },
    )
}

struct Shared<Req, Resp> {
    pending: VecDeque<Slot<Req, Resp>>,
    transport: Option<Task>,
    closed: bool,
    failed: Option<Error>,
}

struct Slot<Req, Resp> {
    // Some until the request has been accepted by the sink.
    request: Option<Req>,
    promise: oneshot::Sender<Result<Resp, Error>>,
}

/// The caller-facing half of a pipelined client: an asynchronous
/// function from requests to responses.
pub struct PipelineClient<Req, Resp> {
    shared: Rc<RefCell<Shared<Req, Resp>>>,
}

impl<Req, Resp> Clone for PipelineClient<Req, Resp> {
    fn clone(&self) -> Self {
        PipelineClient {
            shared: self.shared.clone(),
        }
    }
}

impl<Req, Resp> PipelineClient<Req, Resp> {
    /// Enqueues one call. The returned future resolves with the matching
    /// response, or with the connection's error if the transport fails
    /// first.
    pub fn call(&self, request: Req) -> ResponseFuture<Resp> {
        let (tx, rx) = oneshot::channel();
        let mut shared = self.shared.borrow_mut();
        if let Some(ref e) = shared.failed {
            let _ = tx.send(Err(e.clone()));
        } else if shared.closed {
            let _ = tx.send(Err(Error::Cancelled));
        } else {
            shared.pending.push_back(Slot {
                request: Some(request),
                promise: tx,
            });
            if let Some(task) = shared.transport.take() {
                task.unpark();
            }
        }
        ResponseFuture { rx }
    }

    /// Stops accepting new calls. Outstanding responses still arrive;
    /// the transport flushes and finishes once they have.
    pub fn close(&self) {
        let mut shared = self.shared.borrow_mut();
        shared.closed = true;
        if let Some(task) = shared.transport.take() {
            task.unpark();
        }
    }
}

/// Future for one pipelined call.
pub struct ResponseFuture<Resp> {
    rx: oneshot::Receiver<Result<Resp, Error>>,
}

impl<Resp> Future for ResponseFuture<Resp> {
    type Item = Resp;
    type Error = Error;

    fn poll(&mut self) -> Poll<Resp, Error> {
        match try_ready!(self.rx.poll()) {
            Ok(response) => Ok(Async::Ready(response)),
            Err(e) => Err(e),
        }
    }

    fn cancel(&mut self) {
        // The slot stays in the FIFO (ordering is positional); the
        // response is discarded on arrival.
        self.rx.cancel();
    }
}

/// The connection-driving half of a pipelined client; spawn it on the
/// executor owning the transport.
pub struct PipelineTransport<St, Si>
where
    St: Stream,
    Si: Sink,
{
    stream: St,
    sink: Si,
    shared: Rc<RefCell<Shared<Si::SinkItem, St::Item>>>,
}

impl<St, Si> PipelineTransport<St, Si>
where
    St: Stream<Error = Error>,
    Si: Sink<SinkError = Error>,
{
    fn fail(&mut self, e: Error) -> Error {
        debug!("pipeline transport failed: {}", e);
        let mut shared = self.shared.borrow_mut();
        shared.failed = Some(e.clone());
        shared.closed = true;
        for slot in shared.pending.drain(..) {
            let _ = slot.promise.send(Err(e.clone()));
        }
        e
    }
}

impl<St, Si> Future for PipelineTransport<St, Si>
where
    St: Stream<Error = Error>,
    Si: Sink<SinkError = Error>,
{
    type Item = ();
    type Error = Error;

    fn poll(&mut self) -> Poll<(), Error> {
        // New calls land in the queue outside of this poll; leave them a
        // handle to wake us with.
        self.shared.borrow_mut().transport = Some(task::park());

        loop {
            let mut progress = false;

            // Send pump: encode queued requests in order.
            loop {
                let next = {
                    let mut shared = self.shared.borrow_mut();
                    shared
                        .pending
                        .iter_mut()
                        .enumerate()
                        .find(|(_, slot)| slot.request.is_some())
                        .map(|(index, slot)| (index, slot.request.take().unwrap()))
                };
                let (index, request) = match next {
                    Some(pair) => pair,
                    None => break,
                };
                let sent = self.sink.start_send(request);
                match sent {
                    Ok(AsyncSink::Ready) => {
                        trace!("pipeline: request {} sent", index);
                        progress = true;
                    }
                    Ok(AsyncSink::NotReady(request)) => {
                        self.shared.borrow_mut().pending[index].request = Some(request);
                        break;
                    }
                    Err(e) => return Err(self.fail(e)),
                }
            }

            let flushed = self.sink.poll_complete();
            if let Err(e) = flushed {
                return Err(self.fail(e));
            }

            // Receive pump: each decoded response resolves the head
            // promise, strictly in arrival order.
            loop {
                let polled = self.stream.poll();
                match polled {
                    Ok(Async::Ready(Some(response))) => {
                        progress = true;
                        let head = self.shared.borrow_mut().pending.pop_front();
                        let head = match head {
                            Some(slot) => slot,
                            None => {
                                let e = Error::Codec("response without a pending request".into());
                                return Err(self.fail(e));
                            }
                        };
                        if head.request.is_some() {
                            let e = Error::Codec("response to an unsent request".into());
                            return Err(self.fail(e));
                        }
                        let _ = head.promise.send(Ok(response));
                    }
                    Ok(Async::Ready(None)) => {
                        let outstanding = !self.shared.borrow().pending.is_empty();
                        if outstanding {
                            let e =
                                Error::io("pipeline", io::ErrorKind::UnexpectedEof.into());
                            return Err(self.fail(e));
                        }
                        self.shared.borrow_mut().closed = true;
                        trace!("pipeline: peer closed, transport finished");
                        return Ok(Async::Ready(()));
                    }
                    Ok(Async::NotReady) => break,
                    Err(e) => return Err(self.fail(e)),
                }
            }

            let (closed, drained) = {
                let shared = self.shared.borrow();
                (shared.closed, shared.pending.is_empty())
            };
            if closed && drained {
                let closing = self.sink.close();
                match closing {
                    Ok(Async::Ready(())) => {
                        trace!("pipeline: closed");
                        return Ok(Async::Ready(()));
                    }
                    Ok(Async::NotReady) => return Ok(Async::NotReady),
                    Err(e) => return Err(self.fail(e)),
                }
            }

            if !progress {
                return Ok(Async::NotReady);
            }
        }
    }

    fn cancel(&mut self) {
        self.fail(Error::Cancelled);
    }
}
