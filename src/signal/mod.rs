//! OS signal delivery as a stream (unix only).
//!
//! ```no_run
//! use strand::prelude::*;
//! use strand::runtime::Handle;
//! use strand::signal::Signal;
//!
//! # fn docs(handle: &Handle) {
//! let on_int = Signal::new(libc::SIGINT, handle).for_each(|signum| {
//!     println!("killed by {}", signum);
//!     Handle::current().stop();
//!     Ok(())
//! });
//! # drop(on_int);
//! # }
//! ```

use libc::c_int;

use crate::error::Error;
use crate::poll::{Async, Poll};
use crate::runtime::Handle;
use crate::stream::Stream;
use crate::task;

/// A stream yielding one item per delivery of an OS signal.
///
/// The process-wide handler is shared; dropping the stream unregisters
/// only this listener.
pub struct Signal {
    handle: Handle,
    signum: c_int,
    key: Option<usize>,
}

impl Signal {
    /// Starts listening for `signum` on the runtime behind `handle`.
    pub fn new(signum: c_int, handle: &Handle) -> Signal {
        Signal {
            handle: handle.clone(),
            signum,
            key: None,
        }
    }

    /// The signal number this stream listens for.
    pub fn signum(&self) -> c_int {
        self.signum
    }
}

impl Stream for Signal {
    type Item = c_int;
    type Error = Error;

    fn poll(&mut self) -> Poll<Option<c_int>, Error> {
        let key = match self.key {
            Some(key) => key,
            None => {
                let signum = self.signum;
                let key = self
                    .handle
                    .driver(|driver| driver.add_signal(signum))
                    .ok_or(Error::Cancelled)?
                    .map_err(|e| Error::io("signal", e))?;
                self.key = Some(key);
                key
            }
        };
        let delivered = self
            .handle
            .driver(|driver| {
                if driver.consume_signal(key) {
                    true
                } else {
                    driver.park_signal(key, task::park());
                    false
                }
            })
            .unwrap_or(false);
        if delivered {
            Ok(Async::Ready(Some(self.signum)))
        } else {
            Ok(Async::NotReady)
        }
    }
}

impl Drop for Signal {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.handle.driver(|driver| driver.remove_signal(key));
        }
    }
}
