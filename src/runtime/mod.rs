//! The single-threaded cooperative executor.
//!
//! A [`Runtime`] owns a deque of ready tasks and a reactor driver. Tasks
//! are polled FIFO; a task that returns `NotReady` is not polled again
//! until something unparks it. When nothing is ready the loop blocks in
//! the reactor, bounded by the earliest timer deadline.
//!
//! Parallelism is obtained by running one runtime per OS thread; nothing
//! here is shared across threads.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io;
use std::rc::{Rc, Weak};
use std::time::Duration;

use log::warn;

use crate::error::Error;
use crate::future::{BoxFuture, Future};
use crate::reactor::Driver;
use crate::task::{self, Core};

/// Builds a [`Runtime`] with non-default parameters.
///
/// ```no_run
/// use strand::runtime::Builder;
///
/// let rt = Builder::new().event_capacity(256).build().unwrap();
/// # drop(rt);
/// ```
#[derive(Debug)]
pub struct Builder {
    event_capacity: usize,
}

impl Builder {
    /// Returns a builder with default parameters.
    pub fn new() -> Builder {
        Builder {
            event_capacity: 1024,
        }
    }

    /// Capacity of the OS event batch processed per reactor turn.
    pub fn event_capacity(&mut self, capacity: usize) -> &mut Self {
        self.event_capacity = capacity;
        self
    }

    /// Creates the configured runtime.
    pub fn build(&mut self) -> io::Result<Runtime> {
        let driver = Driver::new(self.event_capacity)?;
        Ok(Runtime {
            inner: Rc::new(Shared {
                ready: RefCell::new(VecDeque::new()),
                driver: RefCell::new(driver),
                alive: Cell::new(0),
                stop: Cell::new(false),
                next_id: Cell::new(1),
            }),
        })
    }
}

impl Default for Builder {
    fn default() -> Builder {
        Builder::new()
    }
}

pub(crate) struct Shared {
    ready: RefCell<VecDeque<Rc<Core>>>,
    driver: RefCell<Driver>,
    alive: Cell<usize>,
    stop: Cell<bool>,
    next_id: Cell<u64>,
}

impl Shared {
    pub(crate) fn enqueue(&self, core: Rc<Core>) {
        self.ready.borrow_mut().push_back(core);
    }

    fn spawn_boxed(self: &Rc<Self>, future: BoxFuture<(), Error>) {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.alive.set(self.alive.get() + 1);
        self.enqueue(Core::new(id, future, Rc::downgrade(self)));
    }
}

/// An executor driving spawned futures on the current thread.
pub struct Runtime {
    inner: Rc<Shared>,
}

impl Runtime {
    /// Creates a runtime with default parameters.
    pub fn new() -> io::Result<Runtime> {
        Builder::new().build()
    }

    /// Returns a cloneable handle usable to spawn tasks and reach the
    /// reactor, including from inside running tasks via
    /// [`Handle::current`].
    pub fn handle(&self) -> Handle {
        Handle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Spawns a future as a new task.
    ///
    /// The future's error type is the crate [`Error`]; an error that
    /// reaches the executor is logged and discarded, so callers that care
    /// attach a handler with `then`/`or_else` before spawning.
    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Item = (), Error = Error> + 'static,
    {
        self.inner.spawn_boxed(Box::new(future));
    }

    /// Runs the loop until [`Handle::stop`] is observed at a quiescent
    /// point.
    pub fn run(&mut self) -> io::Result<()> {
        let _enter = enter(self.handle());
        loop {
            self.poll_ready_tasks();
            if self.inner.stop.replace(false) {
                return Ok(());
            }
            self.turn(None)?;
        }
    }

    /// Runs the loop until no live tasks remain (or until stopped).
    pub fn run_until_idle(&mut self) -> io::Result<()> {
        let _enter = enter(self.handle());
        loop {
            self.poll_ready_tasks();
            if self.inner.stop.replace(false) {
                return Ok(());
            }
            if self.inner.alive.get() == 0 {
                return Ok(());
            }
            self.turn(None)?;
        }
    }

    /// Drives `future` to completion, returning its outcome. Other
    /// spawned tasks are polled while it runs.
    pub fn block_on<F>(&mut self, future: F) -> Result<F::Item, F::Error>
    where
        F: Future + 'static,
        F::Item: 'static,
        F::Error: 'static,
    {
        let _enter = enter(self.handle());
        let result: Rc<RefCell<Option<Result<F::Item, F::Error>>>> = Rc::new(RefCell::new(None));
        let slot = result.clone();
        self.inner.spawn_boxed(Box::new(future.then(move |outcome| {
            *slot.borrow_mut() = Some(outcome);
            Ok(())
        })));
        loop {
            self.poll_ready_tasks();
            if let Some(outcome) = result.borrow_mut().take() {
                return outcome;
            }
            // Reactor failure here is unrecoverable for the loop.
            self.turn(None).expect("reactor poll failed");
        }
    }

    fn poll_ready_tasks(&self) {
        loop {
            let batch: Vec<Rc<Core>> = {
                let mut ready = self.inner.ready.borrow_mut();
                if ready.is_empty() {
                    break;
                }
                ready.drain(..).collect()
            };
            for core in batch {
                if task::run(&core) {
                    self.inner.alive.set(self.inner.alive.get() - 1);
                }
            }
        }
    }

    fn turn(&self, max_wait: Option<Duration>) -> io::Result<()> {
        self.inner.driver.borrow_mut().turn(max_wait)
    }

    #[cfg(test)]
    pub(crate) fn io_watcher_count(&self) -> usize {
        self.inner.driver.borrow().io_watcher_count()
    }
}

/// A cheap handle onto a [`Runtime`], valid for as long as the runtime is
/// alive.
#[derive(Clone)]
pub struct Handle {
    inner: Weak<Shared>,
}

impl Handle {
    /// The handle of the runtime currently running on this thread.
    ///
    /// # Panics
    ///
    /// Panics when no runtime is running on this thread.
    pub fn current() -> Handle {
        CONTEXT
            .with(|ctx| ctx.borrow().clone())
            .expect("no runtime is running on this thread")
    }

    /// Spawns a future onto the runtime. A no-op (with a warning) if the
    /// runtime has been dropped.
    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Item = (), Error = Error> + 'static,
    {
        match self.inner.upgrade() {
            Some(inner) => inner.spawn_boxed(Box::new(future)),
            None => warn!("spawn on a dropped runtime; future discarded"),
        }
    }

    /// Signals the run loop to break at the next quiescent point.
    pub fn stop(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.stop.set(true);
        }
    }

    /// Runs `f` against the reactor driver. `None` if the runtime has
    /// been dropped.
    pub(crate) fn driver<R>(&self, f: impl FnOnce(&mut Driver) -> R) -> Option<R> {
        self.inner
            .upgrade()
            .map(|inner| f(&mut inner.driver.borrow_mut()))
    }
}

thread_local! {
    static CONTEXT: RefCell<Option<Handle>> = RefCell::new(None);
}

struct Enter {
    prev: Option<Handle>,
}

fn enter(handle: Handle) -> Enter {
    let prev = CONTEXT.with(|ctx| ctx.borrow_mut().replace(handle));
    Enter { prev }
}

impl Drop for Enter {
    fn drop(&mut self) {
        let prev = self.prev.take();
        CONTEXT.with(|ctx| *ctx.borrow_mut() = prev);
    }
}
