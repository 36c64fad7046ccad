//! Task handles and the scoped current-task facility.
//!
//! A task wraps a spawned future together with its scheduling state. While
//! the executor is polling a task, that task is exposed through a scoped
//! thread-local so that leaf futures can obtain a [`Task`] handle with
//! [`park`] and arrange to be woken later.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use log::{debug, error, trace};

use crate::error::Error;
use crate::future::{BoxFuture, Future};
use crate::poll::Async;
use crate::runtime::Shared;

/// Scheduling state of a task.
///
/// `Queued → Running → { Parked | Queued | Done }`; `Parked → Queued` via
/// [`Task::unpark`]. An unpark landing while the task is `Running` marks
/// it `Notified` so the poll's `NotReady` re-enqueues instead of parking.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum State {
    Queued,
    Running,
    Notified,
    Parked,
    Done,
}

pub(crate) struct Core {
    id: u64,
    state: Cell<State>,
    future: RefCell<Option<BoxFuture<(), Error>>>,
    exec: Weak<Shared>,
}

impl Core {
    pub(crate) fn new(id: u64, future: BoxFuture<(), Error>, exec: Weak<Shared>) -> Rc<Core> {
        Rc::new(Core {
            id,
            state: Cell::new(State::Queued),
            future: RefCell::new(Some(future)),
            exec,
        })
    }
}

/// A cheaply clonable handle capable of unparking one specific task.
///
/// Handles are obtained with [`park`] while the task is being polled, and
/// stashed wherever the wakeup will come from: a reactor watcher, a timer
/// slot, a promise.
#[derive(Clone)]
pub struct Task {
    core: Rc<Core>,
}

impl Task {
    /// Moves the task from `Parked` to ready and enqueues it on its
    /// executor. Unparking a running task requeues it after the current
    /// poll returns; unparking a completed task is a no-op.
    pub fn unpark(&self) {
        match self.core.state.get() {
            State::Parked => {
                self.core.state.set(State::Queued);
                if let Some(exec) = self.core.exec.upgrade() {
                    trace!("unpark: task {} requeued", self.core.id);
                    exec.enqueue(self.core.clone());
                }
            }
            State::Running => self.core.state.set(State::Notified),
            State::Queued | State::Notified | State::Done => {}
        }
    }

    /// The executor-assigned id of this task.
    pub fn id(&self) -> u64 {
        self.core.id
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.core.id)
            .field("state", &self.core.state.get())
            .finish()
    }
}

thread_local! {
    static CURRENT: RefCell<Vec<Task>> = RefCell::new(Vec::new());
}

/// Returns a handle to the task currently being polled.
///
/// # Panics
///
/// Panics when called outside of a poll: there is no task to park, and
/// suspending would be unrecoverable, so this is treated as a fatal bug.
pub fn park() -> Task {
    CURRENT
        .with(|c| c.borrow().last().cloned())
        .expect("task::park() called outside of a running task")
}

/// Polls one task, isolating panics to it. Returns whether the task
/// reached a terminal state.
pub(crate) fn run(core: &Rc<Core>) -> bool {
    if core.state.get() == State::Done {
        return false;
    }
    let mut future = match core.future.borrow_mut().take() {
        Some(f) => f,
        None => return false,
    };
    core.state.set(State::Running);

    CURRENT.with(|c| c.borrow_mut().push(Task { core: core.clone() }));
    let res = panic::catch_unwind(AssertUnwindSafe(|| future.poll()));
    CURRENT.with(|c| {
        c.borrow_mut().pop();
    });

    match res {
        Ok(Ok(Async::NotReady)) => {
            *core.future.borrow_mut() = Some(future);
            if core.state.get() == State::Notified {
                core.state.set(State::Queued);
                if let Some(exec) = core.exec.upgrade() {
                    exec.enqueue(core.clone());
                }
            } else {
                // The poll is trusted to have parked the task somewhere;
                // a NotReady with no pending wakeup loses the task.
                core.state.set(State::Parked);
            }
            false
        }
        Ok(Ok(Async::Ready(()))) => {
            trace!("task {} finished", core.id);
            core.state.set(State::Done);
            true
        }
        Ok(Err(e)) => {
            // Errors reaching the executor had no handler attached by the
            // spawner; dropping them here is documented behavior.
            debug!("task {} failed: {}", core.id, e);
            core.state.set(State::Done);
            true
        }
        Err(payload) => {
            error!("task {} panicked: {}", core.id, panic_message(&*payload));
            core.state.set(State::Done);
            true
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}
