use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use log::trace;
use slab::Slab;

use crate::task::Task;

/// Timer slots plus a deadline heap. Cancelled entries are removed from
/// the slab immediately and skipped lazily when their heap entry
/// surfaces.
pub(crate) struct TimerQueue {
    slots: Slab<TimerSlot>,
    deadlines: BinaryHeap<Reverse<(Instant, usize)>>,
}

struct TimerSlot {
    deadline: Instant,
    fired: bool,
    task: Option<Task>,
}

impl TimerQueue {
    pub(crate) fn new() -> TimerQueue {
        TimerQueue {
            slots: Slab::new(),
            deadlines: BinaryHeap::new(),
        }
    }

    pub(crate) fn insert(&mut self, deadline: Instant) -> usize {
        let key = self.slots.insert(TimerSlot {
            deadline,
            fired: false,
            task: None,
        });
        self.deadlines.push(Reverse((deadline, key)));
        key
    }

    /// Whether the timer has fired. A missing slot reads as fired so a
    /// stale handle cannot park forever.
    pub(crate) fn fired(&self, key: usize) -> bool {
        self.slots.get(key).map_or(true, |s| s.fired)
    }

    pub(crate) fn park(&mut self, key: usize, task: Task) {
        if let Some(slot) = self.slots.get_mut(key) {
            slot.task = Some(task);
        }
    }

    pub(crate) fn cancel(&mut self, key: usize) {
        if self.slots.contains(key) {
            self.slots.remove(key);
        }
    }

    /// How long the reactor may block: until the earliest live deadline,
    /// capped by `cap`. `None` means block indefinitely.
    pub(crate) fn next_timeout(&mut self, now: Instant, cap: Option<Duration>) -> Option<Duration> {
        let next = loop {
            match self.deadlines.peek() {
                Some(&Reverse((when, key))) => match self.slots.get(key) {
                    Some(slot) if slot.deadline == when && !slot.fired => break Some(when),
                    _ => {
                        self.deadlines.pop();
                    }
                },
                None => break None,
            }
        };
        match next {
            None => cap,
            Some(when) => {
                let until = when.saturating_duration_since(now);
                Some(cap.map_or(until, |c| c.min(until)))
            }
        }
    }

    /// Fires every timer whose deadline has passed, unparking parked
    /// tasks.
    pub(crate) fn fire(&mut self, now: Instant) {
        while let Some(&Reverse((when, key))) = self.deadlines.peek() {
            if when > now {
                break;
            }
            self.deadlines.pop();
            if let Some(slot) = self.slots.get_mut(key) {
                // The key may have been reused; the deadline check keeps a
                // recycled slot from firing early.
                if slot.deadline == when && !slot.fired {
                    slot.fired = true;
                    if let Some(task) = slot.task.take() {
                        trace!("timer {} fired", key);
                        task.unpark();
                    }
                }
            }
        }
    }
}
