//! Identifiers shared across the runtime.
//!
//! All ids here are 32-bit and handed out monotonically from a process-wide
//! atomic counter: an opaque value, never zero. `NonZeroU32` makes the
//! "zero is invalid" rule a type-level property instead of a runtime check.

use std::fmt;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

/// Shared monotonic counter backing [`ActorId`], [`TimerId`], [`BusId`], and
/// [`MonitorRef`]. Starting above the reserved sentinel values means the
/// first id handed out by any of these types never collides with them.
fn next_id(counter: &AtomicU32) -> NonZeroU32 {
    let raw = counter.fetch_add(1, Ordering::Relaxed);
    NonZeroU32::new(raw).expect("id counter wrapped past u32::MAX")
}

/// Identifies a single actor for the lifetime of the runtime.
///
/// Two values are reserved for non-actor senders:
/// [`ActorId::SYSTEM`] labels exit notifications and [`ActorId::TIMER`]
/// labels timer ticks. Real actors are always allocated starting from
/// [`ActorId::FIRST_DYNAMIC`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(NonZeroU32);

static ACTOR_COUNTER: AtomicU32 = AtomicU32::new(ActorId::FIRST_DYNAMIC_RAW);

impl ActorId {
    const FIRST_DYNAMIC_RAW: u32 = 3;

    /// Sender id attached to system-generated messages (link/monitor exits).
    pub const SYSTEM: ActorId = ActorId(NonZeroU32::new(1).unwrap());

    /// Sender id attached to timer-generated messages.
    pub const TIMER: ActorId = ActorId(NonZeroU32::new(2).unwrap());

    /// The first id a real, spawned actor can receive.
    pub const FIRST_DYNAMIC: ActorId = ActorId(NonZeroU32::new(Self::FIRST_DYNAMIC_RAW).unwrap());

    /// Allocate the next fresh dynamic actor id.
    pub(crate) fn next() -> Self {
        ActorId(next_id(&ACTOR_COUNTER))
    }

    /// Returns the id's raw numeric value.
    pub fn as_u32(&self) -> u32 {
        self.0.get()
    }

    /// True for the two reserved, non-actor ids.
    pub fn is_reserved(&self) -> bool {
        *self == Self::SYSTEM || *self == Self::TIMER
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

/// Identifies a timer created via [`crate::timer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(NonZeroU32);

static TIMER_COUNTER: AtomicU32 = AtomicU32::new(1);

impl TimerId {
    pub(crate) fn next() -> Self {
        TimerId(next_id(&TIMER_COUNTER))
    }

    pub fn as_u32(&self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Identifies a topic bus created via [`crate::bus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BusId(NonZeroU32);

static BUS_COUNTER: AtomicU32 = AtomicU32::new(1);

impl BusId {
    pub(crate) fn next() -> Self {
        BusId(next_id(&BUS_COUNTER))
    }

    pub fn as_u32(&self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for BusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bus#{}", self.0)
    }
}

/// Reference returned by [`crate::supervise::monitor`], used later to
/// [`crate::supervise::demonitor`]. Strictly increasing and never reused
/// within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonitorRef(NonZeroU32);

static MONITOR_COUNTER: AtomicU32 = AtomicU32::new(1);

impl MonitorRef {
    pub(crate) fn next() -> Self {
        MonitorRef(next_id(&MONITOR_COUNTER))
    }

    pub fn as_u32(&self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for MonitorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "monref#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_ids_are_unique_and_monotonic() {
        let a = ActorId::next();
        let b = ActorId::next();
        assert!(b.as_u32() > a.as_u32());
    }

    #[test]
    fn reserved_ids_are_fixed() {
        assert_eq!(ActorId::SYSTEM.as_u32(), 1);
        assert_eq!(ActorId::TIMER.as_u32(), 2);
        assert!(ActorId::SYSTEM.is_reserved());
        assert!(!ActorId::FIRST_DYNAMIC.is_reserved());
    }

    #[test]
    fn monitor_refs_are_positive_and_unique() {
        let r1 = MonitorRef::next();
        let r2 = MonitorRef::next();
        assert_ne!(r1, r2);
        assert!(r1.as_u32() > 0);
    }
}
