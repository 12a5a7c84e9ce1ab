//! One-shot and periodic timers, tracked as plain data rather than a
//! hand-rolled timer wheel. This table is driven from the executor's own
//! idle wait, so no extra tokio task is spawned per timer.

use std::collections::HashMap;
use std::time::Duration;

use slab::Slab;
use tokio::time::Instant;

use crate::ids::{ActorId, TimerId};
use crate::status::Status;

struct TimerEntry {
    id: TimerId,
    owner: ActorId,
    deadline: Instant,
    period: Option<Duration>,
    tag: u32,
}

/// Fixed-capacity pool of live timers.
pub struct TimerTable {
    slots: Slab<TimerEntry>,
    index: HashMap<TimerId, usize>,
    capacity: usize,
}

impl TimerTable {
    pub fn new(capacity: usize) -> Self {
        TimerTable {
            slots: Slab::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            capacity,
        }
    }

    fn insert(&mut self, owner: ActorId, deadline: Instant, period: Option<Duration>, tag: u32) -> Result<TimerId, Status> {
        if self.slots.len() >= self.capacity {
            return Err(Status::nomem("timer table at capacity"));
        }
        let id = TimerId::next();
        let key = self.slots.insert(TimerEntry {
            id,
            owner,
            deadline,
            period,
            tag,
        });
        self.index.insert(id, key);
        Ok(id)
    }

    /// Schedule a one-shot timer that fires `delay` from now.
    pub fn after(&mut self, owner: ActorId, delay: Duration, tag: u32) -> Result<TimerId, Status> {
        self.insert(owner, Instant::now() + delay, None, tag)
    }

    /// Schedule a periodic timer firing every `period`, starting one
    /// period from now.
    pub fn every(&mut self, owner: ActorId, period: Duration, tag: u32) -> Result<TimerId, Status> {
        if period.is_zero() {
            return Err(Status::invalid("timer period must be nonzero"));
        }
        self.insert(owner, Instant::now() + period, Some(period), tag)
    }

    /// Cancel a timer. Idempotent: canceling an already-fired or unknown id
    /// is reported as `Invalid` rather than panicking.
    pub fn cancel(&mut self, id: TimerId) -> Status {
        match self.index.remove(&id) {
            Some(key) => {
                self.slots.try_remove(key);
                Status::OK
            }
            None => Status::invalid("unknown or already-fired timer id"),
        }
    }

    /// The soonest deadline among all live timers, if any — what the
    /// executor's idle wait sleeps until.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.slots.iter().map(|(_, e)| e.deadline).min()
    }

    /// Remove and report every timer whose deadline has passed, rescheduling
    /// periodic ones for their next tick. Returns `(owner, tag)` pairs in
    /// no particular cross-timer order — each is delivered to its owner's
    /// mailbox by the caller.
    pub fn drain_due(&mut self, now: Instant) -> Vec<(ActorId, u32)> {
        let due_keys: Vec<usize> = self
            .slots
            .iter()
            .filter(|(_, e)| e.deadline <= now)
            .map(|(k, _)| k)
            .collect();

        let mut fired = Vec::with_capacity(due_keys.len());
        for key in due_keys {
            let entry = &mut self.slots[key];
            fired.push((entry.owner, entry.tag));
            match entry.period {
                Some(period) => entry.deadline += period,
                None => {
                    self.index.remove(&entry.id);
                    self.slots.try_remove(key);
                }
            }
        }
        fired
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ActorId;

    #[tokio::test(start_paused = true)]
    async fn one_shot_fires_once() {
        let mut table = TimerTable::new(4);
        let owner = ActorId::FIRST_DYNAMIC;
        table.after(owner, Duration::from_millis(10), 7).unwrap();
        tokio::time::advance(Duration::from_millis(11)).await;
        let fired = table.drain_due(Instant::now());
        assert_eq!(fired, vec![(owner, 7)]);
        assert!(table.is_empty());
        assert!(table.drain_due(Instant::now()).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_timer_reschedules() {
        let mut table = TimerTable::new(4);
        let owner = ActorId::FIRST_DYNAMIC;
        table.every(owner, Duration::from_millis(10), 1).unwrap();
        tokio::time::advance(Duration::from_millis(11)).await;
        assert_eq!(table.drain_due(Instant::now()).len(), 1);
        assert_eq!(table.len(), 1);
        tokio::time::advance(Duration::from_millis(11)).await;
        assert_eq!(table.drain_due(Instant::now()).len(), 1);
    }

    #[test]
    fn cancel_is_idempotent_and_reports_invalid_twice() {
        let mut table = TimerTable::new(4);
        let id = table.after(ActorId::FIRST_DYNAMIC, Duration::from_secs(1), 0).unwrap();
        assert!(table.cancel(id).is_ok());
        assert!(!table.cancel(id).is_ok());
    }

    #[test]
    fn capacity_enforced() {
        let mut table = TimerTable::new(1);
        table.after(ActorId::FIRST_DYNAMIC, Duration::from_secs(1), 0).unwrap();
        assert!(table.after(ActorId::FIRST_DYNAMIC, Duration::from_secs(1), 0).is_err());
    }
}
