use std::collections::VecDeque;

use log::{debug, trace};

use crate::error::Error;
use crate::future::Future;
use crate::poll::{Async, Poll};
use crate::rpc::Service;
use crate::sink::{AsyncSink, Sink};
use crate::stream::Stream;

const DEFAULT_MAX_IN_FLIGHT: usize = 32;

/// Couples a request stream, a service and a response sink; resolves when
/// the connection is fully drained or fails.
pub fn serve<St, S, Si>(stream: St, service: S, sink: Si) -> Serve<St, S, Si>
where
    St: Stream<Item = S::Request, Error = Error>,
    S: Service,
    Si: Sink<SinkItem = S::Response, SinkError = Error>,
{
    Serve {
        stream: Some(stream),
        service,
        sink,
        in_flight: VecDeque::new(),
        max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        sink_full: false,
        state: State::Running,
    }
}

/// Future for [`serve`]: one RPC server connection.
///
/// Responses are emitted in request-arrival order even when a later
/// service call completes first; a completed response waits in the
/// staging queue behind its elders. When the decoder stream ends, the
/// in-flight calls finish, the sink is flushed, and the future resolves.
/// The first error from decoder, service or sink resolves the future
/// with that error and cancels the in-flight calls.
pub struct Serve<St, S, Si>
where
    S: Service,
{
    stream: Option<St>,
    service: S,
    sink: Si,
    in_flight: VecDeque<InFlight<S::Future, S::Response>>,
    max_in_flight: usize,
    sink_full: bool,
    state: State,
}

enum InFlight<F, R> {
    Dispatched(F),
    Done(R),
}

#[derive(PartialEq)]
enum State {
    Running,
    Poisoned,
    Cancelled,
}

impl<St, S, Si> Serve<St, S, Si>
where
    St: Stream<Item = S::Request, Error = Error>,
    S: Service,
    Si: Sink<SinkItem = S::Response, SinkError = Error>,
{
    /// Replaces the bound on concurrently running service calls
    /// (default 32).
    pub fn max_in_flight(mut self, limit: usize) -> Serve<St, S, Si> {
        assert!(limit > 0);
        self.max_in_flight = limit;
        self
    }

    fn fail(&mut self, e: Error) -> Error {
        debug!("rpc server failed: {}", e);
        for slot in self.in_flight.iter_mut() {
            if let InFlight::Dispatched(ref mut f) = slot {
                f.cancel();
            }
        }
        self.in_flight.clear();
        self.stream = None;
        self.state = State::Poisoned;
        e
    }
}

impl<St, S, Si> Future for Serve<St, S, Si>
where
    St: Stream<Item = S::Request, Error = Error>,
    S: Service,
    Si: Sink<SinkItem = S::Response, SinkError = Error>,
{
    type Item = ();
    type Error = Error;

    fn poll(&mut self) -> Poll<(), Error> {
        match self.state {
            State::Running => {}
            State::Poisoned => return Err(Error::InvalidPollState),
            State::Cancelled => return Err(Error::Cancelled),
        }

        loop {
            let mut progress = false;

            // Pull new requests while there is room and the sink is
            // keeping up.
            while self.stream.is_some()
                && !self.sink_full
                && self.in_flight.len() < self.max_in_flight
            {
                let polled = self.stream.as_mut().unwrap().poll();
                match polled {
                    Ok(Async::Ready(Some(request))) => {
                        trace!("rpc server: request accepted");
                        let future = self.service.call(request);
                        self.in_flight.push_back(InFlight::Dispatched(future));
                        progress = true;
                    }
                    Ok(Async::Ready(None)) => {
                        trace!("rpc server: requests drained");
                        self.stream = None;
                    }
                    Ok(Async::NotReady) => break,
                    Err(e) => return Err(self.fail(e)),
                }
            }

            // Advance every running service call; completion order is
            // whatever it is, the queue keeps arrival order.
            let mut failure = None;
            for slot in self.in_flight.iter_mut() {
                if let InFlight::Dispatched(ref mut future) = slot {
                    match future.poll() {
                        Ok(Async::Ready(response)) => {
                            *slot = InFlight::Done(response);
                            progress = true;
                        }
                        Ok(Async::NotReady) => {}
                        Err(e) => {
                            failure = Some(e);
                            break;
                        }
                    }
                }
            }
            if let Some(e) = failure {
                return Err(self.fail(e));
            }

            // Offer finished responses to the sink, head first.
            while let Some(&InFlight::Done(_)) = self.in_flight.front() {
                let response = match self.in_flight.pop_front() {
                    Some(InFlight::Done(response)) => response,
                    _ => unreachable!(),
                };
                let sent = self.sink.start_send(response);
                match sent {
                    Ok(AsyncSink::Ready) => progress = true,
                    Ok(AsyncSink::NotReady(response)) => {
                        self.in_flight.push_front(InFlight::Done(response));
                        self.sink_full = true;
                        break;
                    }
                    Err(e) => return Err(self.fail(e)),
                }
            }

            let flushed = self.sink.poll_complete();
            match flushed {
                Ok(Async::Ready(())) => {
                    // Draining may have reopened the request intake; run
                    // another round so the stream gets polled (and its
                    // watcher armed) before suspending.
                    if self.sink_full {
                        progress = true;
                    }
                    self.sink_full = false;
                }
                Ok(Async::NotReady) => {}
                Err(e) => return Err(self.fail(e)),
            }

            if self.stream.is_none() && self.in_flight.is_empty() {
                let closed = self.sink.close();
                match closed {
                    Ok(Async::Ready(())) => {
                        trace!("rpc server: finished");
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
        for slot in self.in_flight.iter_mut() {
            if let InFlight::Dispatched(ref mut f) = slot {
                f.cancel();
            }
        }
        self.in_flight.clear();
        self.stream = None;
        self.state = State::Cancelled;
    }
}
