//! Timers, and timeouts composed from them.

use std::time::{Duration, Instant};

use crate::error::Error;
use crate::future::Future;
use crate::poll::{Async, Poll};
use crate::runtime::Handle;
use crate::task;

/// A future resolving once a deadline passes.
pub struct Delay {
    handle: Handle,
    deadline: Instant,
    key: Option<usize>,
    state: State,
}

#[derive(PartialEq)]
enum State {
    Waiting,
    Done,
    Cancelled,
}

impl Delay {
    /// Creates a delay firing `after` from now, on the reactor behind
    /// `handle`.
    pub fn new(handle: &Handle, after: Duration) -> Delay {
        Delay::until(handle, Instant::now() + after)
    }

    /// Creates a delay firing at `deadline`.
    pub fn until(handle: &Handle, deadline: Instant) -> Delay {
        Delay {
            handle: handle.clone(),
            deadline,
            key: None,
            state: State::Waiting,
        }
    }

    /// The instant this delay fires at.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    fn unlink(&mut self) {
        if let Some(key) = self.key.take() {
            self.handle.driver(|driver| driver.cancel_timer(key));
        }
    }
}

impl Future for Delay {
    type Item = ();
    type Error = Error;

    fn poll(&mut self) -> Poll<(), Error> {
        match self.state {
            State::Cancelled => return Err(Error::Cancelled),
            State::Done => return Err(Error::InvalidPollState),
            State::Waiting => {}
        }
        let deadline = self.deadline;
        let key = match self.key {
            Some(key) => key,
            None => {
                let key = self
                    .handle
                    .driver(|driver| driver.add_timer(deadline))
                    .ok_or(Error::Cancelled)?;
                self.key = Some(key);
                key
            }
        };
        let fired = self
            .handle
            .driver(|driver| {
                if driver.timer_fired(key) {
                    true
                } else {
                    driver.park_timer(key, task::park());
                    false
                }
            })
            .unwrap_or(true);
        if fired {
            self.state = State::Done;
            self.unlink();
            Ok(Async::Ready(()))
        } else {
            Ok(Async::NotReady)
        }
    }

    fn cancel(&mut self) {
        self.unlink();
        self.state = State::Cancelled;
    }
}

impl Drop for Delay {
    fn drop(&mut self) {
        self.unlink();
    }
}

/// Runs a future against a deadline: whichever side finishes first wins,
/// and the winner cancels the loser.
///
/// On expiry the inner future is cancelled and the timeout resolves to
/// [`Error::Elapsed`].
pub struct Timeout<F> {
    future: F,
    delay: Delay,
}

impl<F> Timeout<F>
where
    F: Future<Error = Error>,
{
    /// Bounds `future` to complete within `after`.
    pub fn new(future: F, after: Duration, handle: &Handle) -> Timeout<F> {
        Timeout {
            future,
            delay: Delay::new(handle, after),
        }
    }
}

impl<F> Future for Timeout<F>
where
    F: Future<Error = Error>,
{
    type Item = F::Item;
    type Error = Error;

    fn poll(&mut self) -> Poll<F::Item, Error> {
        match self.future.poll() {
            Ok(Async::NotReady) => {}
            Ok(Async::Ready(item)) => {
                self.delay.cancel();
                return Ok(Async::Ready(item));
            }
            Err(e) => {
                self.delay.cancel();
                return Err(e);
            }
        }
        match self.delay.poll() {
            Ok(Async::NotReady) => Ok(Async::NotReady),
            Ok(Async::Ready(())) => {
                self.future.cancel();
                Err(Error::Elapsed)
            }
            Err(e) => Err(e),
        }
    }

    fn cancel(&mut self) {
        self.future.cancel();
        self.delay.cancel();
    }
}
