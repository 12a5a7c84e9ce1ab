//! The shared topic bus: a bounded ring of fan-out entries with
//! per-subscriber read cursors tracked as bits in a `u32` mask.
//!
//! Built on `bytes::Bytes` instead of a generic `M: Message` clone so
//! publishing never depends on an actor's own message type.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use slab::Slab;

use crate::ids::BusId;
use crate::status::Status;

/// Hard cap on live subscribers per bus — one bit per subscriber in a
/// `u32` mask.
pub const MAX_SUBSCRIBERS: usize = 32;

/// Parameters for a new bus, mirroring the fields each published entry
/// is checked or stamped against.
#[derive(Debug, Clone, Copy)]
pub struct BusConfig {
    /// Ring capacity: oldest entry is evicted once a publish would exceed it.
    pub capacity: usize,
    /// Entries older than this are expired (dropped from the tail) on the
    /// next publish. `None` disables age-based expiry.
    pub max_age: Option<Duration>,
    /// Payloads larger than this are rejected with `Status::invalid`.
    pub max_entry_size: usize,
    /// Once an entry has been read by this many distinct subscribers it is
    /// evicted early, regardless of ring occupancy. `0` disables this —
    /// entries then age out purely by `capacity`/`max_age`.
    pub max_readers: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        BusConfig {
            capacity: 64,
            max_age: None,
            max_entry_size: 4096,
            max_readers: 0,
        }
    }
}

struct Entry {
    payload: Bytes,
    readers_mask: u32,
    read_count: u32,
    published_at: DateTime<Utc>,
}

/// A single named topic: bounded history plus subscriber cursors.
pub struct Bus {
    config: BusConfig,
    entries: VecDeque<Entry>,
    subscriber_mask: u32,
    subscriber_count: u32,
    waiters: Vec<(u32, Waker)>,
}

impl Bus {
    fn new(config: BusConfig) -> Self {
        Bus {
            entries: VecDeque::with_capacity(config.capacity.min(64)),
            config,
            subscriber_mask: 0,
            subscriber_count: 0,
            waiters: Vec::new(),
        }
    }

    /// A fresh subscriber's cursor starts at the current head: mark every
    /// entry already in the ring as "read" by this bit so only entries
    /// published from here on are visible to it.
    fn subscribe(&mut self) -> Result<u32, Status> {
        for bit in 0..MAX_SUBSCRIBERS as u32 {
            if self.subscriber_mask & (1 << bit) == 0 {
                self.subscriber_mask |= 1 << bit;
                self.subscriber_count += 1;
                for entry in &mut self.entries {
                    entry.readers_mask |= 1 << bit;
                }
                return Ok(bit);
            }
        }
        Err(Status::nomem("bus subscriber slots exhausted"))
    }

    fn unsubscribe(&mut self, bit: u32) -> Status {
        let mask = 1u32 << bit;
        if self.subscriber_mask & mask == 0 {
            return Status::invalid("reader bit not subscribed");
        }
        self.subscriber_mask &= !mask;
        self.subscriber_count -= 1;
        self.waiters.retain(|(b, _)| *b != bit);
        Status::OK
    }

    fn expire_by_age(&mut self, now: DateTime<Utc>) {
        if let Some(max_age) = self.config.max_age {
            while let Some(front) = self.entries.front() {
                if now.signed_duration_since(front.published_at).to_std().unwrap_or_default() > max_age {
                    self.entries.pop_front();
                } else {
                    break;
                }
            }
        }
    }

    fn publish(&mut self, payload: Bytes) -> Status {
        if payload.len() > self.config.max_entry_size {
            return Status::invalid("payload exceeds max_entry_size");
        }
        self.expire_by_age(Utc::now());
        if self.entries.len() >= self.config.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(Entry {
            payload,
            readers_mask: 0,
            read_count: 0,
            published_at: Utc::now(),
        });
        let waiters = std::mem::take(&mut self.waiters);
        for (bit, waker) in waiters {
            if self.subscriber_mask & (1 << bit) != 0 {
                waker.wake();
            }
        }
        Status::OK
    }

    fn read(&mut self, bit: u32) -> Result<Bytes, Status> {
        let mask = 1u32 << bit;
        if self.subscriber_mask & mask == 0 {
            return Err(Status::invalid("reader bit not subscribed"));
        }
        let found = self.entries.iter().position(|e| e.readers_mask & mask == 0);
        let Some(idx) = found else {
            return Err(Status::would_block("no unread entries for this subscriber"));
        };
        let payload = {
            let entry = &mut self.entries[idx];
            entry.readers_mask |= mask;
            entry.read_count += 1;
            entry.payload.clone()
        };
        if self.config.max_readers > 0 && self.entries[idx].read_count as usize >= self.config.max_readers {
            self.entries.remove(idx);
        }
        Ok(payload)
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

/// Fixed-capacity pool of named buses, shared between the executor and
/// every actor's context the way [`crate::actor::ActorTable`] is.
pub struct BusTable {
    slots: Slab<Bus>,
    index: HashMap<BusId, usize>,
    capacity: usize,
}

impl BusTable {
    pub fn new(capacity: usize) -> Self {
        BusTable {
            slots: Slab::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            capacity,
        }
    }

    pub fn create(&mut self, config: BusConfig) -> Result<BusId, Status> {
        if self.slots.len() >= self.capacity {
            return Err(Status::nomem("bus table at capacity"));
        }
        let id = BusId::next();
        let key = self.slots.insert(Bus::new(config));
        self.index.insert(id, key);
        Ok(id)
    }

    pub fn destroy(&mut self, id: BusId) -> Status {
        let Some(&key) = self.index.get(&id) else {
            return Status::invalid("unknown bus id");
        };
        match self.slots.get(key) {
            Some(bus) if bus.subscriber_count > 0 => Status::invalid("bus still has subscribers"),
            Some(_) => {
                self.index.remove(&id);
                self.slots.try_remove(key);
                Status::OK
            }
            None => Status::invalid("unknown bus id"),
        }
    }

    fn get_mut(&mut self, id: BusId) -> Option<&mut Bus> {
        let key = *self.index.get(&id)?;
        self.slots.get_mut(key)
    }

    pub fn subscribe(&mut self, id: BusId) -> Result<u32, Status> {
        self.get_mut(id).ok_or_else(|| Status::invalid("unknown bus id"))?.subscribe()
    }

    pub fn unsubscribe(&mut self, id: BusId, bit: u32) -> Status {
        match self.get_mut(id) {
            Some(bus) => bus.unsubscribe(bit),
            None => Status::invalid("unknown bus id"),
        }
    }

    pub fn publish(&mut self, id: BusId, payload: Bytes) -> Status {
        match self.get_mut(id) {
            Some(bus) => bus.publish(payload),
            None => Status::invalid("unknown bus id"),
        }
    }

    pub fn read(&mut self, id: BusId, bit: u32) -> Result<Bytes, Status> {
        self.get_mut(id).ok_or_else(|| Status::invalid("unknown bus id"))?.read(bit)
    }

    pub fn entry_count(&self, id: BusId) -> Option<usize> {
        let key = *self.index.get(&id)?;
        self.slots.get(key).map(Bus::entry_count)
    }

    fn register_waiter(&mut self, id: BusId, bit: u32, waker: Waker) {
        if let Some(bus) = self.get_mut(id) {
            bus.waiters.push((bit, waker));
        }
    }
}

/// Blocks until `read` would return an entry, or forever if nothing is
/// ever published again (matching the runtime's deadlock policy rather
/// than silently returning early).
pub struct ReadWait {
    table: Rc<RefCell<BusTable>>,
    id: BusId,
    bit: u32,
}

impl ReadWait {
    pub fn new(table: Rc<RefCell<BusTable>>, id: BusId, bit: u32) -> Self {
        ReadWait { table, id, bit }
    }
}

impl Future for ReadWait {
    type Output = Result<Bytes, Status>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut table = self.table.borrow_mut();
        match table.read(self.id, self.bit) {
            Err(status) if status.code == crate::status::StatusCode::WouldBlock => {
                table.register_waiter(self.id, self.bit, cx.waker().clone());
                Poll::Pending
            }
            other => Poll::Ready(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(capacity: usize) -> BusConfig {
        BusConfig {
            capacity,
            ..Default::default()
        }
    }

    #[test]
    fn publish_then_read_roundtrips() {
        let mut table = BusTable::new(4);
        let id = table.create(cfg(8)).unwrap();
        let bit = table.subscribe(id).unwrap();
        assert!(table.publish(id, Bytes::from_static(b"hello")).is_ok());
        let got = table.read(id, bit).unwrap();
        assert_eq!(&got[..], b"hello");
        assert!(table.read(id, bit).is_err());
    }

    #[test]
    fn eviction_by_capacity_drops_oldest() {
        let mut table = BusTable::new(4);
        let id = table.create(cfg(2)).unwrap();
        let bit = table.subscribe(id).unwrap();
        table.publish(id, Bytes::from_static(b"a"));
        table.publish(id, Bytes::from_static(b"b"));
        table.publish(id, Bytes::from_static(b"c"));
        assert_eq!(table.entry_count(id), Some(2));
        assert_eq!(&table.read(id, bit).unwrap()[..], b"b");
        assert_eq!(&table.read(id, bit).unwrap()[..], b"c");
    }

    #[test]
    fn late_subscriber_does_not_see_earlier_entries() {
        let mut table = BusTable::new(4);
        let id = table.create(cfg(8)).unwrap();
        table.publish(id, Bytes::from_static(b"early"));
        let bit = table.subscribe(id).unwrap();
        table.publish(id, Bytes::from_static(b"late"));
        assert_eq!(&table.read(id, bit).unwrap()[..], b"late");
        assert!(table.read(id, bit).is_err());
    }

    #[test]
    fn oversized_payload_rejected() {
        let mut table = BusTable::new(4);
        let id = table
            .create(BusConfig {
                max_entry_size: 4,
                ..cfg(8)
            })
            .unwrap();
        assert!(!table.publish(id, Bytes::from_static(b"toolong")).is_ok());
    }

    #[test]
    fn max_readers_evicts_entry_once_read_enough_times() {
        let mut table = BusTable::new(4);
        let id = table
            .create(BusConfig {
                max_readers: 2,
                ..cfg(8)
            })
            .unwrap();
        let a = table.subscribe(id).unwrap();
        let b = table.subscribe(id).unwrap();
        table.publish(id, Bytes::from_static(b"x"));
        assert_eq!(table.entry_count(id), Some(1));
        table.read(id, a).unwrap();
        assert_eq!(table.entry_count(id), Some(1));
        table.read(id, b).unwrap();
        assert_eq!(table.entry_count(id), Some(0));
    }

    #[test]
    fn destroy_rejects_while_subscribers_remain() {
        let mut table = BusTable::new(4);
        let id = table.create(cfg(8)).unwrap();
        let bit = table.subscribe(id).unwrap();
        assert!(!table.destroy(id).is_ok());
        table.unsubscribe(id, bit);
        assert!(table.destroy(id).is_ok());
    }

    #[tokio::test]
    async fn read_wait_resolves_once_published() {
        let table = Rc::new(RefCell::new(BusTable::new(4)));
        let id = table.borrow_mut().create(cfg(8)).unwrap();
        let bit = table.borrow_mut().subscribe(id).unwrap();

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let wait_table = table.clone();
                let waiter = tokio::task::spawn_local(async move {
                    ReadWait::new(wait_table, id, bit).await.unwrap()
                });
                tokio::task::yield_now().await;
                table.borrow_mut().publish(id, Bytes::from_static(b"woke"));
                let got = waiter.await.unwrap();
                assert_eq!(&got[..], b"woke");
            })
            .await;
    }
}
