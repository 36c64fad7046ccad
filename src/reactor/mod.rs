//! Translation of OS readiness into task wakeups.
//!
//! The driver wraps a [`mio::Poll`] instance and owns a slab of watcher
//! slots, one per registered descriptor. A slot records the cached
//! readiness per direction and at most one parked task per direction.
//! Watchers are one-shot: a readiness event stores the bit, takes the
//! parked task and unparks it; re-arming happens on the next poll that
//! would block. Timers and unix signals ride the same `turn`.

use std::io;
use std::time::{Duration, Instant};

use log::trace;
use mio::event::Source;
use mio::{Events, Interest, Token};
use slab::Slab;

use crate::task::Task;

mod timer;

use self::timer::TimerQueue;

#[cfg(unix)]
const SIGNAL_TOKEN: Token = Token(usize::MAX);

pub(crate) struct Driver {
    poll: mio::Poll,
    events: Events,
    io: Slab<ScheduledIo>,
    timers: TimerQueue,
    #[cfg(unix)]
    signals: Option<SignalPipe>,
}

#[derive(Default)]
struct ScheduledIo {
    read_ready: bool,
    write_ready: bool,
    read_task: Option<Task>,
    write_task: Option<Task>,
}

impl Driver {
    pub(crate) fn new(event_capacity: usize) -> io::Result<Driver> {
        Ok(Driver {
            poll: mio::Poll::new()?,
            events: Events::with_capacity(event_capacity),
            io: Slab::new(),
            timers: TimerQueue::new(),
            #[cfg(unix)]
            signals: None,
        })
    }

    // ===== I/O watchers =====

    /// Registers a descriptor for both directions and returns its watcher
    /// key.
    pub(crate) fn add_source<E: Source>(&mut self, source: &mut E) -> io::Result<usize> {
        let entry = self.io.vacant_entry();
        let key = entry.key();
        self.poll
            .registry()
            .register(source, Token(key), Interest::READABLE | Interest::WRITABLE)?;
        entry.insert(ScheduledIo::default());
        trace!("watcher {} registered", key);
        Ok(key)
    }

    /// Unlinks a watcher, returning any tasks that were parked on it so
    /// the caller can deliver the cancellation wakeup.
    pub(crate) fn deregister<E: Source>(
        &mut self,
        key: usize,
        source: &mut E,
    ) -> (Option<Task>, Option<Task>) {
        let _ = self.poll.registry().deregister(source);
        if self.io.contains(key) {
            trace!("watcher {} removed", key);
            let slot = self.io.remove(key);
            (slot.read_task, slot.write_task)
        } else {
            (None, None)
        }
    }

    pub(crate) fn read_ready(&self, key: usize) -> bool {
        self.io.get(key).map_or(false, |s| s.read_ready)
    }

    pub(crate) fn write_ready(&self, key: usize) -> bool {
        self.io.get(key).map_or(false, |s| s.write_ready)
    }

    pub(crate) fn clear_read_ready(&mut self, key: usize) {
        if let Some(slot) = self.io.get_mut(key) {
            slot.read_ready = false;
        }
    }

    pub(crate) fn clear_write_ready(&mut self, key: usize) {
        if let Some(slot) = self.io.get_mut(key) {
            slot.write_ready = false;
        }
    }

    /// Parks `task` awaiting read readiness. At most one task may be
    /// parked per direction; a second park replaces the first.
    pub(crate) fn park_read(&mut self, key: usize, task: Task) {
        if let Some(slot) = self.io.get_mut(key) {
            slot.read_task = Some(task);
        }
    }

    pub(crate) fn park_write(&mut self, key: usize, task: Task) {
        if let Some(slot) = self.io.get_mut(key) {
            slot.write_task = Some(task);
        }
    }

    #[cfg(test)]
    pub(crate) fn io_watcher_count(&self) -> usize {
        self.io.len()
    }

    // ===== timers =====

    pub(crate) fn add_timer(&mut self, deadline: Instant) -> usize {
        self.timers.insert(deadline)
    }

    pub(crate) fn timer_fired(&self, key: usize) -> bool {
        self.timers.fired(key)
    }

    pub(crate) fn park_timer(&mut self, key: usize, task: Task) {
        self.timers.park(key, task);
    }

    pub(crate) fn cancel_timer(&mut self, key: usize) {
        self.timers.cancel(key);
    }

    // ===== event loop =====

    /// Processes at most one batch of OS events, blocking until the
    /// earliest timer deadline or `max_wait`, whichever comes first
    /// (indefinitely when neither bounds the wait). Readiness events
    /// store their bits and unpark the watchers' tasks; expired timers
    /// fire afterwards.
    pub(crate) fn turn(&mut self, max_wait: Option<Duration>) -> io::Result<()> {
        let timeout = self.timers.next_timeout(Instant::now(), max_wait);
        match self.poll.poll(&mut self.events, timeout) {
            Ok(()) => {}
            // A signal interrupting the wait is handled like a spurious
            // wakeup; the pipe drain below picks up anything pending.
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }

        #[cfg(unix)]
        let mut signal_hit = false;

        for event in self.events.iter() {
            let token = event.token();

            #[cfg(unix)]
            {
                if token == SIGNAL_TOKEN {
                    signal_hit = true;
                    continue;
                }
            }

            if let Some(slot) = self.io.get_mut(token.0) {
                if event.is_readable() || event.is_read_closed() || event.is_error() {
                    slot.read_ready = true;
                    if let Some(task) = slot.read_task.take() {
                        task.unpark();
                    }
                }
                if event.is_writable() || event.is_write_closed() || event.is_error() {
                    slot.write_ready = true;
                    if let Some(task) = slot.write_task.take() {
                        task.unpark();
                    }
                }
            }
        }

        #[cfg(unix)]
        {
            if signal_hit {
                self.dispatch_signals();
            }
        }

        self.timers.fire(Instant::now());
        Ok(())
    }
}

// ===== unix signals =====

#[cfg(unix)]
mod sig {
    use super::*;
    use std::collections::HashMap;
    use std::io::Read;
    use std::os::unix::io::AsRawFd;

    pub(super) struct SignalPipe {
        pub(super) rx: mio::net::UnixStream,
        // Kept alive for the registered handlers, which hold its raw fd.
        pub(super) tx: mio::net::UnixStream,
        pub(super) listeners: Slab<SignalListener>,
        pub(super) registered: HashMap<libc::c_int, signal_hook_registry::SigId>,
    }

    pub(super) struct SignalListener {
        pub(super) signum: libc::c_int,
        pub(super) pending: u64,
        pub(super) task: Option<Task>,
    }

    impl Driver {
        /// Arms delivery of `signum` into this driver and returns a
        /// listener key. The process-wide handler writes one byte per
        /// receipt into a self-pipe drained by `turn`.
        pub(crate) fn add_signal(&mut self, signum: libc::c_int) -> io::Result<usize> {
            if self.signals.is_none() {
                let (tx, mut rx) = mio::net::UnixStream::pair()?;
                self.poll
                    .registry()
                    .register(&mut rx, SIGNAL_TOKEN, Interest::READABLE)?;
                self.signals = Some(SignalPipe {
                    rx,
                    tx,
                    listeners: Slab::new(),
                    registered: HashMap::new(),
                });
            }
            let pipe = self.signals.as_mut().unwrap();

            if !pipe.registered.contains_key(&signum) {
                let fd = pipe.tx.as_raw_fd();
                // The handler body is async-signal-safe: a single write.
                let id = unsafe {
                    signal_hook_registry::register(signum, move || {
                        let byte = signum as u8;
                        unsafe {
                            libc::write(fd, &byte as *const u8 as *const libc::c_void, 1);
                        }
                    })
                }?;
                pipe.registered.insert(signum, id);
            }

            Ok(pipe.listeners.insert(SignalListener {
                signum,
                pending: 0,
                task: None,
            }))
        }

        /// Consumes one pending delivery for the listener, if any.
        pub(crate) fn consume_signal(&mut self, key: usize) -> bool {
            match self.signals.as_mut().and_then(|p| p.listeners.get_mut(key)) {
                Some(l) if l.pending > 0 => {
                    l.pending -= 1;
                    true
                }
                _ => false,
            }
        }

        pub(crate) fn park_signal(&mut self, key: usize, task: Task) {
            if let Some(l) = self.signals.as_mut().and_then(|p| p.listeners.get_mut(key)) {
                l.task = Some(task);
            }
        }

        pub(crate) fn remove_signal(&mut self, key: usize) {
            if let Some(pipe) = self.signals.as_mut() {
                if pipe.listeners.contains(key) {
                    pipe.listeners.remove(key);
                }
            }
        }

        pub(super) fn dispatch_signals(&mut self) {
            let pipe = match self.signals.as_mut() {
                Some(p) => p,
                None => return,
            };
            let mut buf = [0u8; 32];
            loop {
                match pipe.rx.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        for &byte in &buf[..n] {
                            trace!("signal {} delivered", byte);
                            for (_, listener) in pipe.listeners.iter_mut() {
                                if listener.signum == libc::c_int::from(byte) {
                                    listener.pending += 1;
                                    if let Some(task) = listener.task.take() {
                                        task.unpark();
                                    }
                                }
                            }
                        }
                    }
                    Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(_) => break,
                }
            }
        }
    }

    impl Drop for Driver {
        fn drop(&mut self) {
            if let Some(pipe) = self.signals.take() {
                for (_, id) in pipe.registered {
                    signal_hook_registry::unregister(id);
                }
            }
        }
    }
}

#[cfg(unix)]
use self::sig::SignalPipe;
