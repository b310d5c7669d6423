//! Delayed transition queue
//!
//! Holds work that must happen a fixed time after it was scheduled, such as
//! an element's entrance animation starting once its cascade delay elapses.
//! Nothing runs on its own: the owner calls [`DelayQueue::pop_due`] with the
//! current frame time and applies whatever came due.
//!
//! Time is passed in explicitly rather than read from a clock, so the same
//! queue serves real frames (`Instant` deltas) and deterministic tests.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use unveil_animation::DelayQueue;
//!
//! let mut queue = DelayQueue::new();
//! let now = Duration::ZERO;
//!
//! queue.schedule(now, Duration::from_millis(200), "second");
//! let first = queue.schedule(now, Duration::from_millis(100), "first");
//! let cancelled = queue.schedule(now, Duration::from_millis(100), "never");
//! queue.cancel(cancelled);
//!
//! let due: Vec<_> = queue.pop_due(Duration::from_millis(150)).collect();
//! assert_eq!(due, vec![(first, "first")]);
//! assert_eq!(queue.len(), 1);
//! ```

use slotmap::{new_key_type, SlotMap};
use std::time::Duration;

new_key_type! {
    /// Handle to a scheduled entry
    pub struct TimerId;
}

struct Entry<T> {
    due: Duration,
    /// Scheduling order, breaks ties between entries due at the same time
    seq: u64,
    payload: T,
}

/// Queue of payloads waiting for their due time
pub struct DelayQueue<T> {
    entries: SlotMap<TimerId, Entry<T>>,
    next_seq: u64,
}

impl<T> DelayQueue<T> {
    pub fn new() -> Self {
        Self {
            entries: SlotMap::with_key(),
            next_seq: 0,
        }
    }

    /// Schedule `payload` to come due `delay` after `now`
    pub fn schedule(&mut self, now: Duration, delay: Duration, payload: T) -> TimerId {
        let seq = self.next_seq;
        self.next_seq += 1;
        let due = now.saturating_add(delay);
        tracing::trace!("DelayQueue: scheduled entry due at {:?}", due);
        self.entries.insert(Entry { due, seq, payload })
    }

    /// Cancel a scheduled entry, returning its payload if it was still pending
    ///
    /// Cancelling an entry that already fired or was already cancelled is a
    /// no-op.
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        self.entries.remove(id).map(|entry| entry.payload)
    }

    /// Remove and return every entry due at or before `now`
    ///
    /// Entries come out ordered by due time, then by scheduling order.
    pub fn pop_due(&mut self, now: Duration) -> impl Iterator<Item = (TimerId, T)> {
        let mut due: Vec<(Duration, u64, TimerId)> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.due <= now)
            .map(|(id, entry)| (entry.due, entry.seq, id))
            .collect();
        due.sort_unstable_by_key(|(at, seq, _)| (*at, *seq));

        let fired: Vec<(TimerId, T)> = due
            .into_iter()
            .filter_map(|(_, _, id)| self.entries.remove(id).map(|entry| (id, entry.payload)))
            .collect();
        fired.into_iter()
    }

    /// Earliest due time among pending entries
    pub fn next_due(&self) -> Option<Duration> {
        self.entries.values().map(|entry| entry.due).min()
    }

    pub fn contains(&self, id: TimerId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for DelayQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
