//! Cooperative timer queue.
//!
//! Every animation tick, the periodic refresh, the news update and the clock
//! run off one queue on one thread. A timer carries a [`Tick`] value rather
//! than a callback; the board decides what a tick means when it fires.
//!
//! The queue never reads a wall clock. The host advances it with
//! [`TimerQueue::advance_to`] (an offset from board start) and then drains
//! [`TimerQueue::pop_due`], which keeps tests fully deterministic.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};
use std::time::Duration;

use crate::lane::LaneKey;

/// Opaque handle of a scheduled timer. Handles are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

/// What a timer means when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tick {
    /// Animation step for one lane.
    Lane(LaneKey),
    /// Periodic lane refresh (may be deferred).
    Refresh,
    /// A previously deferred refresh whose blocking alerts have all cycled.
    DeferredRefresh,
    /// Periodic news headline update.
    News,
    /// Clock display update.
    Clock,
}

/// Schedule/cancel contract used by the marquee engine.
pub trait Scheduler {
    /// Fire `tick` once, `delay` from the scheduler's current time.
    fn schedule_after(&mut self, delay: Duration, tick: Tick) -> TimerHandle;

    /// Cancel a pending timer. Returns `false` if it already fired or was
    /// cancelled before.
    fn cancel(&mut self, handle: TimerHandle) -> bool;
}

#[derive(Debug)]
struct Entry {
    deadline: Duration,
    handle: TimerHandle,
    tick: Tick,
}

impl Entry {
    fn key(&self) -> (Duration, TimerHandle) {
        (self.deadline, self.handle)
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Min-heap of timers ordered by deadline, then by scheduling order.
#[derive(Debug, Default)]
pub struct TimerQueue {
    now: Duration,
    next_id: u64,
    heap: BinaryHeap<Reverse<Entry>>,
    /// Handles that are scheduled and not yet fired or cancelled.
    live: HashSet<TimerHandle>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current queue time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Move the queue clock forward. Going backwards is ignored.
    pub fn advance_to(&mut self, now: Duration) {
        if now > self.now {
            self.now = now;
        }
    }

    pub fn advance_by(&mut self, delta: Duration) {
        self.now += delta;
    }

    /// Pop the earliest timer whose deadline has passed.
    pub fn pop_due(&mut self) -> Option<(TimerHandle, Tick)> {
        loop {
            let due =
                matches!(self.heap.peek(), Some(Reverse(entry)) if entry.deadline <= self.now);
            if !due {
                return None;
            }
            let Reverse(entry) = self.heap.pop()?;
            if self.live.remove(&entry.handle) {
                return Some((entry.handle, entry.tick));
            }
            // cancelled; drop it
        }
    }

    /// Deadline of the next live timer, if any.
    pub fn next_deadline(&mut self) -> Option<Duration> {
        while let Some(Reverse(entry)) = self.heap.peek() {
            if self.live.contains(&entry.handle) {
                return Some(entry.deadline);
            }
            self.heap.pop();
        }
        None
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.live.contains(&handle)
    }

    /// Number of live timers.
    pub fn pending(&self) -> usize {
        self.live.len()
    }

    /// Number of live timers carrying `tick`.
    pub fn pending_for(&self, tick: Tick) -> usize {
        self.heap
            .iter()
            .filter(|Reverse(entry)| entry.tick == tick && self.live.contains(&entry.handle))
            .count()
    }

    /// Drop every pending timer.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.live.clear();
    }
}

impl Scheduler for TimerQueue {
    fn schedule_after(&mut self, delay: Duration, tick: Tick) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.heap.push(Reverse(Entry {
            deadline: self.now + delay,
            handle,
            tick,
        }));
        self.live.insert(handle);
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.live.remove(&handle)
    }
}
