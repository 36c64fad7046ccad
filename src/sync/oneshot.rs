//! A one-value promise between two tasks on the same executor.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::Error;
use crate::future::Future;
use crate::poll::{Async, Poll};
use crate::task::{self, Task};

struct Inner<T> {
    value: Option<T>,
    rx_task: Option<Task>,
    tx_alive: bool,
    rx_alive: bool,
}

/// Creates a new promise pair.
///
/// Dropping the [`Sender`] without sending fails the [`Receiver`] with
/// [`Error::Cancelled`].
pub fn channel<T>() -> (Sender<T>, Receiver<T>) {
    let inner = Rc::new(RefCell::new(Inner {
        value: None,
        rx_task: None,
        tx_alive: true,
        rx_alive: true,
    }));
    (
        Sender {
            inner: inner.clone(),
        },
        Receiver {
            inner,
            cancelled: false,
        },
    )
}

/// The fulfilling half of a promise.
pub struct Sender<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T> Sender<T> {
    /// Completes the promise. Fails with the value if the receiver is
    /// gone.
    pub fn send(self, value: T) -> Result<(), T> {
        let mut inner = self.inner.borrow_mut();
        if !inner.rx_alive {
            return Err(value);
        }
        inner.value = Some(value);
        if let Some(task) = inner.rx_task.take() {
            task.unpark();
        }
        Ok(())
    }

    /// Whether the receiving half has been dropped or cancelled.
    pub fn is_canceled(&self) -> bool {
        !self.inner.borrow().rx_alive
    }
}

impl<T> Drop for Sender<T> {
    fn drop(&mut self) {
        let mut inner = self.inner.borrow_mut();
        inner.tx_alive = false;
        if let Some(task) = inner.rx_task.take() {
            task.unpark();
        }
    }
}

/// The awaiting half of a promise.
pub struct Receiver<T> {
    inner: Rc<RefCell<Inner<T>>>,
    cancelled: bool,
}

impl<T> Future for Receiver<T> {
    type Item = T;
    type Error = Error;

    fn poll(&mut self) -> Poll<T, Error> {
        if self.cancelled {
            return Err(Error::Cancelled);
        }
        let mut inner = self.inner.borrow_mut();
        if let Some(value) = inner.value.take() {
            return Ok(Async::Ready(value));
        }
        if !inner.tx_alive {
            return Err(Error::Cancelled);
        }
        inner.rx_task = Some(task::park());
        Ok(Async::NotReady)
    }

    fn cancel(&mut self) {
        self.cancelled = true;
        self.inner.borrow_mut().rx_alive = false;
    }
}

impl<T> Drop for Receiver<T> {
    fn drop(&mut self) {
        self.inner.borrow_mut().rx_alive = false;
    }
}
