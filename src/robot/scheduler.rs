//! Deferred actions on a cooperative, single-threaded clock.
//!
//! Every wait in the repair engine (travel time, repair pause, glass expiry,
//! word hold times) is a scheduled event rather than a blocking call. The
//! owner of a [`Scheduler`] advances it with the current page time and
//! handles the events that fell due, one at a time and in deadline order.
//!
//! [`TimerQueue`] is the only implementation the crate needs: the GUI drives
//! it with wall-clock time since mount, tests drive it with virtual time.

use std::time::Duration;

/// Handle to a scheduled event, used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Timer service injected into the controller and the effect layer.
pub trait Scheduler<E> {
    /// Current time of this scheduler's clock.
    fn now(&self) -> Duration;
    /// Schedule `event` to fire `delay` after [`now`](Self::now).
    fn schedule(&mut self, delay: Duration, event: E) -> TimerId;
    /// Cancel a pending event. Returns false if it already fired or was cancelled.
    fn cancel(&mut self, id: TimerId) -> bool;
    /// Cancel everything; returns how many events were dropped.
    fn cancel_all(&mut self) -> usize;
    /// Pop the earliest event due at or before `until`, moving the clock to
    /// its deadline. When nothing is due the clock moves to `until`.
    fn pop_due(&mut self, until: Duration) -> Option<E>;
    fn pending(&self) -> usize;
}

struct Entry<E> {
    id: TimerId,
    deadline: Duration,
    event: E,
}

/// Deadline-ordered timer list over a manually advanced clock.
pub struct TimerQueue<E> {
    now: Duration,
    next_id: u64,
    entries: Vec<Entry<E>>,
}

impl<E> TimerQueue<E> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            entries: Vec::new(),
        }
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Deadline of the earliest pending event
    pub fn next_deadline(&self) -> Option<Duration> {
        self.entries.iter().map(|e| e.deadline).min()
    }
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Scheduler<E> for TimerQueue<E> {
    fn now(&self) -> Duration {
        self.now
    }

    fn schedule(&mut self, delay: Duration, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            deadline: self.now + delay,
            event,
        });
        id
    }

    fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    fn cancel_all(&mut self) -> usize {
        let n = self.entries.len();
        self.entries.clear();
        n
    }

    fn pop_due(&mut self, until: Duration) -> Option<E> {
        // Earliest deadline first; ties fire in scheduling order
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.deadline <= until)
            .min_by_key(|(_, e)| (e.deadline, e.id))
            .map(|(i, _)| i);

        match idx {
            Some(i) => {
                let entry = self.entries.swap_remove(i);
                self.now = self.now.max(entry.deadline);
                Some(entry.event)
            }
            None => {
                self.now = self.now.max(until);
                None
            }
        }
    }

    fn pending(&self) -> usize {
        self.entries.len()
    }
}
