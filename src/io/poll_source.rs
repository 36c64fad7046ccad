use std::fmt;
use std::io::{self, Read, Write};

use mio::event::Source;

use crate::io::{AsyncRead, AsyncWrite};
use crate::poll::Async;
use crate::runtime::Handle;
use crate::task;

/// Associates an I/O resource that implements the [`std::io::Read`]
/// and/or [`std::io::Write`] traits with the reactor that drives it.
///
/// `PollSource` takes a type that implements [`mio::event::Source`] as
/// well as `Read` and or `Write` and registers it with a runtime's
/// reactor. Once wrapped, the resource can be used from within futures:
/// the `Read`/`Write` implementations consult readiness cached from the
/// reactor and the [`AsyncRead`]/[`AsyncWrite`] hooks park the current
/// task when an operation would block.
///
/// **Note**: at most two tasks may use a `PollSource` concurrently, one
/// for reading and one for writing. The reactor keeps a single parked
/// task per direction; a third task would silently steal the wakeup of
/// another.
///
/// ## Readiness
///
/// Readiness is cached per direction. Once the reactor has reported, say,
/// read readiness, [`poll_read_ready`] keeps returning `Ready` until a
/// `read` hits `WouldBlock`, at which point the cached state is cleared
/// with [`clear_read_ready`] and the current task is parked until the
/// next readiness event. Types building richer operations (such as a
/// listener's `accept`) use the same pair directly:
///
/// ```ignore
/// match self.io.poll_read_ready() {
///     Async::NotReady => return Ok(Async::NotReady),
///     Async::Ready(()) => {}
/// }
/// match self.io.get_ref().accept() {
///     Ok((socket, addr)) => Ok(Async::Ready((socket, addr))),
///     Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
///         self.io.clear_read_ready();
///         Ok(Async::NotReady)
///     }
///     Err(e) => Err(e),
/// }
/// ```
///
/// [`poll_read_ready`]: PollSource::poll_read_ready
/// [`clear_read_ready`]: PollSource::clear_read_ready
pub struct PollSource<E: Source> {
    io: Option<E>,
    key: usize,
    handle: Handle,
}

impl<E> PollSource<E>
where
    E: Source,
{
    /// Creates a new `PollSource`, registering the resource with the
    /// reactor behind `handle`.
    pub fn new(mut io: E, handle: &Handle) -> io::Result<PollSource<E>> {
        let key = handle
            .driver(|driver| driver.add_source(&mut io))
            .unwrap_or_else(|| Err(io::Error::new(io::ErrorKind::Other, "event loop gone")))?;
        Ok(PollSource {
            io: Some(io),
            key,
            handle: handle.clone(),
        })
    }

    /// Returns a shared reference to the underlying I/O object.
    pub fn get_ref(&self) -> &E {
        self.io.as_ref().unwrap()
    }

    /// Returns a mutable reference to the underlying I/O object.
    pub fn get_mut(&mut self) -> &mut E {
        self.io.as_mut().unwrap()
    }

    /// Consumes self, deregistering from the reactor and returning the
    /// inner I/O object.
    pub fn into_inner(mut self) -> io::Result<E> {
        let mut io = self.io.take().unwrap();
        self.handle.driver(|driver| {
            driver.deregister(self.key, &mut io);
        });
        Ok(io)
    }

    /// Checks the resource's read readiness state.
    ///
    /// `NotReady` means the current task has been parked and will be
    /// unparked on the next read readiness event.
    ///
    /// # Panics
    ///
    /// Panics if called from outside of a task context.
    pub fn poll_read_ready(&self) -> Async<()> {
        let ready = self.handle.driver(|driver| {
            if driver.read_ready(self.key) {
                true
            } else {
                driver.park_read(self.key, task::park());
                false
            }
        });
        match ready {
            Some(false) => Async::NotReady,
            // A dropped runtime cannot wake anything again; claiming
            // readiness lets the caller's syscall surface the error.
            Some(true) | None => Async::Ready(()),
        }
    }

    /// Clears cached read readiness and parks the current task until a
    /// new read readiness event arrives.
    ///
    /// # Panics
    ///
    /// Panics if called from outside of a task context.
    pub fn clear_read_ready(&self) {
        self.handle.driver(|driver| {
            driver.clear_read_ready(self.key);
            driver.park_read(self.key, task::park());
        });
    }

    /// Checks the resource's write readiness state; the write twin of
    /// [`poll_read_ready`](PollSource::poll_read_ready).
    pub fn poll_write_ready(&self) -> Async<()> {
        let ready = self.handle.driver(|driver| {
            if driver.write_ready(self.key) {
                true
            } else {
                driver.park_write(self.key, task::park());
                false
            }
        });
        match ready {
            Some(false) => Async::NotReady,
            Some(true) | None => Async::Ready(()),
        }
    }

    /// Clears cached write readiness and parks the current task until a
    /// new write readiness event arrives.
    pub fn clear_write_ready(&self) {
        self.handle.driver(|driver| {
            driver.clear_write_ready(self.key);
            driver.park_write(self.key, task::park());
        });
    }
}

// ===== Read / Write impls =====

impl<E> Read for PollSource<E>
where
    E: Source + Read,
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.poll_read_ready().is_not_ready() {
            return Err(io::ErrorKind::WouldBlock.into());
        }
        let r = self.io.as_mut().unwrap().read(buf);
        if is_wouldblock(&r) {
            self.clear_read_ready();
        }
        r
    }
}

impl<E> Write for PollSource<E>
where
    E: Source + Write,
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.poll_write_ready().is_not_ready() {
            return Err(io::ErrorKind::WouldBlock.into());
        }
        let r = self.io.as_mut().unwrap().write(buf);
        if is_wouldblock(&r) {
            self.clear_write_ready();
        }
        r
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.poll_write_ready().is_not_ready() {
            return Err(io::ErrorKind::WouldBlock.into());
        }
        let r = self.io.as_mut().unwrap().flush();
        if is_wouldblock(&r) {
            self.clear_write_ready();
        }
        r
    }
}

impl<E> AsyncRead for PollSource<E>
where
    E: Source + Read,
{
    fn poll_read(&mut self) -> Async<()> {
        self.poll_read_ready()
    }
}

impl<E> AsyncWrite for PollSource<E>
where
    E: Source + Write,
{
    fn poll_write(&mut self) -> Async<()> {
        self.poll_write_ready()
    }
}

fn is_wouldblock<T>(r: &io::Result<T>) -> bool {
    match *r {
        Ok(_) => false,
        Err(ref e) => e.kind() == io::ErrorKind::WouldBlock,
    }
}

impl<E: Source + fmt::Debug> fmt::Debug for PollSource<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollSource").field("io", &self.io).finish()
    }
}

impl<E: Source> Drop for PollSource<E> {
    fn drop(&mut self) {
        if let Some(mut io) = self.io.take() {
            // Unlink the watcher and wake anything parked on it, so a
            // task waiting downstream observes a spurious wakeup and
            // finds the channel gone.
            let parked = self.handle.driver(|driver| driver.deregister(self.key, &mut io));
            if let Some((read_task, write_task)) = parked {
                if let Some(task) = read_task {
                    task.unpark();
                }
                if let Some(task) = write_task {
                    task.unpark();
                }
            }
        }
    }
}
