//! The actor table: a fixed-capacity pool of control blocks addressed by
//! their monotonic [`ActorId`], backed by a `slab::Slab` plus a side index
//! from id to slot. Single-threaded, so a plain pool stands in for what a
//! concurrent registry would otherwise need a lock-free map for.

use std::collections::HashMap;

use slab::Slab;

use crate::ids::{ActorId, MonitorRef};
use crate::message::Message;
use crate::status::Status;

use super::control_block::{ActorState, ControlBlock};

/// Pool of actor control blocks. `capacity` bounds how many actors may be
/// alive at once; exceeding it yields `Status::nomem`.
pub struct ActorTable<M: Message> {
    slots: Slab<ControlBlock<M>>,
    index: HashMap<ActorId, usize>,
    capacity: usize,
    /// Reverse lookup from a watcher's `MonitorRef` back to the watched
    /// actor, since `demonitor` is called with only the ref in hand.
    monitor_index: HashMap<MonitorRef, ActorId>,
}

impl<M: Message> ActorTable<M> {
    pub fn new(capacity: usize) -> Self {
        ActorTable {
            slots: Slab::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            capacity,
            monitor_index: HashMap::new(),
        }
    }

    pub(crate) fn register_monitor(&mut self, monref: MonitorRef, target: ActorId) {
        self.monitor_index.insert(monref, target);
    }

    pub(crate) fn resolve_monitor(&self, monref: MonitorRef) -> Option<ActorId> {
        self.monitor_index.get(&monref).copied()
    }

    pub(crate) fn forget_monitor(&mut self, monref: MonitorRef) {
        self.monitor_index.remove(&monref);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Insert a freshly-allocated control block. Fails with `Status::nomem`
    /// once `capacity` live (non-freed) slots are occupied.
    pub fn insert(&mut self, block: ControlBlock<M>) -> Result<(), Status> {
        if self.slots.len() >= self.capacity {
            return Err(Status::nomem("actor table at capacity"));
        }
        let id = block.id;
        let key = self.slots.insert(block);
        self.index.insert(id, key);
        Ok(())
    }

    /// Lookup by id, hiding slots whose actor has already died — a dead id
    /// behaves as if never allocated to ordinary callers.
    pub fn get(&self, id: ActorId) -> Option<&ControlBlock<M>> {
        let key = *self.index.get(&id)?;
        let block = self.slots.get(key)?;
        if block.is_dead() {
            None
        } else {
            Some(block)
        }
    }

    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut ControlBlock<M>> {
        let key = *self.index.get(&id)?;
        let block = self.slots.get_mut(key)?;
        if block.is_dead() {
            None
        } else {
            Some(block)
        }
    }

    /// Unfiltered accessor that also reaches slots marked `Dead` — used by
    /// link/monitor cleanup, which must read a peer's `exit_reason`
    /// immediately after it dies, before the slot is freed.
    pub fn get_unchecked(&self, id: ActorId) -> Option<&ControlBlock<M>> {
        let key = *self.index.get(&id)?;
        self.slots.get(key)
    }

    pub fn get_unchecked_mut(&mut self, id: ActorId) -> Option<&mut ControlBlock<M>> {
        let key = *self.index.get(&id)?;
        self.slots.get_mut(key)
    }

    pub fn mark_dead(&mut self, id: ActorId) {
        if let Some(block) = self.get_unchecked_mut(id) {
            block.state = ActorState::Dead;
        }
    }

    /// Physically remove a dead slot, recycling its pool slot. `id` itself
    /// is never reused — only the underlying slab key is.
    pub fn free(&mut self, id: ActorId) {
        if let Some(key) = self.index.remove(&id) {
            self.slots.try_remove(key);
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.index.keys().copied()
    }
}
