//! End-to-end RPC over loopback TCP: echo, pipelining, timeouts.
//!
//! Client and server share one single-threaded runtime; everything is
//! event-driven, so nothing deadlocks.

use std::cell::RefCell;
use std::net::SocketAddr;
use std::rc::Rc;
use std::time::Duration;

use strand::codec::{FramedRead, FramedWrite, LinesCodec};
use strand::future::{self, BoxFuture};
use strand::io::{self, TransferAtLeast};
use strand::net::{TcpListener, TcpStream};
use strand::prelude::*;
use strand::rpc::{self, Service};
use strand::runtime::{Handle, Runtime};
use strand::time::{Delay, Timeout};
use strand::Error;

struct Echo;

impl Service for Echo {
    type Request = String;
    type Response = String;
    type Future = future::FutureResult<String, Error>;

    fn call(&mut self, line: String) -> Self::Future {
        future::ok(line)
    }
}

/// Echoes, but completes later requests sooner: 30 ms, then 20 ms, then
/// 10 ms. Response staging must still deliver in arrival order.
struct SkewedEcho {
    calls: usize,
}

impl Service for SkewedEcho {
    type Request = String;
    type Response = String;
    type Future = BoxFuture<String, Error>;

    fn call(&mut self, line: String) -> Self::Future {
        let delays = [30u64, 20, 10];
        let delay = Duration::from_millis(delays[self.calls % delays.len()]);
        self.calls += 1;
        Delay::new(&Handle::current(), delay)
            .map(move |()| line)
            .boxed()
    }
}

fn spawn_line_server<S>(rt: &Runtime, service_factory: impl Fn() -> S + 'static) -> SocketAddr
where
    S: Service<Request = String, Response = String> + 'static,
{
    let addr = "127.0.0.1:0".parse().unwrap();
    let listener = TcpListener::bind(&addr, &rt.handle()).unwrap();
    let bound = listener.local_addr().unwrap();
    rt.spawn(
        listener
            .incoming()
            .for_each(move |(socket, _peer)| {
                let (rd, wr) = socket.split();
                Handle::current().spawn(
                    rpc::serve(
                        FramedRead::new(rd, LinesCodec::new()),
                        service_factory(),
                        FramedWrite::new(wr, LinesCodec::new()),
                    )
                    .then(|_| Ok(())),
                );
                Ok(())
            })
            .then(|_| Ok(())),
    );
    bound
}

fn connect_line_client(
    addr: &SocketAddr,
) -> impl Future<Item = rpc::PipelineClient<String, String>, Error = Error> {
    TcpStream::connect(addr, &Handle::current()).map(|socket| {
        let (rd, wr) = socket.split();
        let (client, transport) = rpc::pipeline(
            FramedRead::new(rd, LinesCodec::new()),
            FramedWrite::new(wr, LinesCodec::new()),
        );
        Handle::current().spawn(transport.then(|_| Ok(())));
        client
    })
}

#[test]
fn line_echo_preserves_order_on_one_connection() {
    let mut rt = Runtime::new().unwrap();
    let addr = spawn_line_server(&rt, || Echo);

    let (hello, world) = rt
        .block_on(future::lazy(move || {
            connect_line_client(&addr).and_then(|client| {
                let hello = client.call("hello".to_string());
                let world = client.call("world".to_string());
                client.close();
                hello.and_then(move |h| world.map(move |w| (h, w)))
            })
        }))
        .unwrap();

    assert_eq!(hello, "hello");
    assert_eq!(world, "world");
}

#[test]
fn responses_resolve_in_call_order_despite_skewed_service_times() {
    let mut rt = Runtime::new().unwrap();
    let addr = spawn_line_server(&rt, || SkewedEcho { calls: 0 });

    // If the server (or client) broke FIFO, a promise would resolve with
    // another call's payload.
    let (a, b, c) = rt
        .block_on(future::lazy(move || {
            connect_line_client(&addr).and_then(|client| {
                let a = client.call("A".to_string());
                let b = client.call("B".to_string());
                let c = client.call("C".to_string());
                client.close();
                a.and_then(move |ra| {
                    b.and_then(move |rb| c.map(move |rc| (ra, rb, rc)))
                })
            })
        }))
        .unwrap();

    assert_eq!((a.as_str(), b.as_str(), c.as_str()), ("A", "B", "C"));
}

#[test]
fn closed_clients_fail_new_calls_immediately() {
    let mut rt = Runtime::new().unwrap();
    let addr = spawn_line_server(&rt, || Echo);

    let outcome = rt.block_on(future::lazy(move || {
        connect_line_client(&addr).and_then(|client| {
            client.close();
            client.call("late".to_string())
        })
    }));
    assert!(matches!(outcome, Err(Error::Cancelled)));
}

#[test]
fn a_read_with_no_data_times_out_and_releases_the_channel() {
    let mut rt = Runtime::new().unwrap();
    let addr = "127.0.0.1:0".parse().unwrap();
    let listener = TcpListener::bind(&addr, &rt.handle()).unwrap();
    let bound = listener.local_addr().unwrap();

    // Accept and hold sockets open without ever writing.
    let parked: Rc<RefCell<Vec<TcpStream>>> = Rc::new(RefCell::new(Vec::new()));
    let parked2 = parked.clone();
    rt.spawn(
        listener
            .incoming()
            .for_each(move |(socket, _peer)| {
                parked2.borrow_mut().push(socket);
                Ok(())
            })
            .then(|_| Ok(())),
    );

    let outcome = rt.block_on(future::lazy(move || {
        TcpStream::connect(&bound, &Handle::current()).and_then(|socket| {
            Timeout::new(
                io::recv(socket, TransferAtLeast::new(1)),
                Duration::from_millis(30),
                &Handle::current(),
            )
        })
    }));
    assert!(matches!(outcome, Err(Error::Elapsed)));
}

#[test]
fn peer_disconnect_fails_all_outstanding_calls() {
    let mut rt = Runtime::new().unwrap();
    let addr = "127.0.0.1:0".parse().unwrap();
    let listener = TcpListener::bind(&addr, &rt.handle()).unwrap();
    let bound = listener.local_addr().unwrap();

    // Accept and immediately drop: every connection resets.
    rt.spawn(
        listener
            .incoming()
            .for_each(|(socket, _peer)| {
                drop(socket);
                Ok(())
            })
            .then(|_| Ok(())),
    );

    let outcome = rt.block_on(future::lazy(move || {
        connect_line_client(&bound).and_then(|client| client.call("anyone?".to_string()))
    }));
    match outcome {
        Err(Error::Io { .. }) => {}
        other => panic!("expected an io error, got {:?}", other.map(|_| ())),
    }
}
