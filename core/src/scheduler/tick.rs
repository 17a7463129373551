//! Explicitly clocked scheduler
//!
//! `TickScheduler` keeps its own game clock that only moves when the host
//! calls [`TickScheduler::advance`]. Due callbacks fire in due-time order,
//! ties broken by scheduling order.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use hashbrown::HashMap;

use super::{DelayCallback, DelayId, Scheduler};
use crate::effects::EffectError;

#[derive(Default)]
struct DelayQueue {
    /// Current game time
    now: Duration,
    next_id: u64,
    pending: BTreeMap<(Duration, DelayId), DelayCallback>,
    due_at: HashMap<DelayId, Duration>,
}

/// Outcome of advancing the clock
#[derive(Debug, Default)]
pub struct TickReport {
    /// Callbacks that ran (including failed ones)
    pub fired: usize,
    pub failures: Vec<EffectError>,
}

/// Single-threaded scheduler driven by [`advance`](Self::advance).
#[derive(Default)]
pub struct TickScheduler {
    queue: RefCell<DelayQueue>,
}

impl fmt::Debug for TickScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queue = self.queue.borrow();
        f.debug_struct("TickScheduler")
            .field("now", &queue.now)
            .field("pending", &queue.pending.len())
            .finish()
    }
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current game time
    pub fn now(&self) -> Duration {
        self.queue.borrow().now
    }

    pub fn pending_count(&self) -> usize {
        self.queue.borrow().pending.len()
    }

    pub fn is_pending(&self, id: DelayId) -> bool {
        self.queue.borrow().due_at.contains_key(&id)
    }

    /// Time left before a pending delay fires
    pub fn time_until(&self, id: DelayId) -> Option<Duration> {
        let queue = self.queue.borrow();
        queue
            .due_at
            .get(&id)
            .map(|due| due.saturating_sub(queue.now))
    }

    /// Move the clock forward, running every callback that comes due.
    ///
    /// Callbacks may schedule or cancel other delays; anything that becomes
    /// due within the advanced window fires in the same call. Failures are
    /// logged and collected, they never stop the remaining callbacks.
    /// The clock saturates at `Duration::MAX`.
    pub fn advance(&self, elapsed: Duration) -> TickReport {
        let until = self.now().saturating_add(elapsed);
        let mut report = TickReport::default();

        while let Some((id, callback)) = self.pop_due(until) {
            report.fired += 1;
            if let Err(err) = callback() {
                tracing::error!(delay = %id, error = %err, "Delayed callback failed");
                report.failures.push(err);
            }
        }

        self.queue.borrow_mut().now = until;
        report
    }

    /// Take the earliest callback due at or before `until`.
    /// The queue borrow is released before the callback runs.
    fn pop_due(&self, until: Duration) -> Option<(DelayId, DelayCallback)> {
        let mut queue = self.queue.borrow_mut();
        let (&(due, id), _) = queue.pending.first_key_value()?;
        if due > until {
            return None;
        }

        let callback = queue.pending.remove(&(due, id))?;
        queue.due_at.remove(&id);
        queue.now = due;
        Some((id, callback))
    }
}

impl Scheduler for TickScheduler {
    fn delay(&self, after: Duration, callback: DelayCallback) -> DelayId {
        let mut queue = self.queue.borrow_mut();
        let id = DelayId(queue.next_id);
        queue.next_id += 1;

        // Delays past the end of the clock are clamped to it
        let due = queue.now.saturating_add(after);
        queue.pending.insert((due, id), callback);
        queue.due_at.insert(id, due);
        tracing::trace!(delay = %id, ?after, "Delay scheduled");
        id
    }

    fn cancel_delay(&self, id: DelayId) -> bool {
        let mut queue = self.queue.borrow_mut();
        match queue.due_at.remove(&id) {
            Some(due) => queue.pending.remove(&(due, id)).is_some(),
            None => false,
        }
    }
}
