//! Per-actor bookkeeping kept by the runtime, outside the actor's own
//! future: identity, scheduling state, mailbox, and supervision lists.
//! States are trimmed to the four the priority executor actually
//! distinguishes.

use crate::ids::{ActorId, MonitorRef};
use crate::mailbox::Mailbox;
use crate::message::{ExitReason, Message};
use crate::priority::ActorPriority;

/// An actor's scheduling state, as seen by the executor's ready queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorState {
    /// Present in a ready queue, eligible to be polled.
    Ready,
    /// Currently being polled by the executor.
    Running,
    /// Suspended awaiting a mailbox message, a timer, a borrow release, or
    /// I/O — woken by its registered waker.
    Blocked,
    /// Its future has resolved; cleanup (link/monitor notification) is
    /// pending or done, and the slot is about to be freed.
    Dead,
}

/// Everything the runtime keeps about an actor outside its own future.
pub struct ControlBlock<M: Message> {
    pub id: ActorId,
    pub name: Option<String>,
    pub priority: ActorPriority,
    pub state: ActorState,
    pub mailbox: Mailbox<M>,
    /// Bidirectional supervision peers: death of either side notifies
    /// the other, carried in both directions in the pair's control blocks.
    pub links: Vec<ActorId>,
    /// Unidirectional observers, each keyed by the `MonitorRef` the
    /// watcher used to install it so a single watcher may monitor the
    /// same actor more than once and remove them independently.
    pub monitors: Vec<(MonitorRef, ActorId)>,
    /// Set by `ActorContext::exit`; consulted once the driving future
    /// resolves to decide between the caller's chosen reason and the
    /// default `Crash`.
    pub(crate) exit_requested: Option<ExitReason>,
}

impl<M: Message> ControlBlock<M> {
    pub fn new(id: ActorId, name: Option<String>, priority: ActorPriority, mailbox_capacity: usize) -> Self {
        let _ = mailbox_capacity; // advisory only: mailboxes grow as needed, bounded by the shared payload pool
        ControlBlock {
            id,
            name,
            priority,
            state: ActorState::Ready,
            mailbox: Mailbox::new(),
            links: Vec::new(),
            monitors: Vec::new(),
            exit_requested: None,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.state == ActorState::Dead
    }
}
