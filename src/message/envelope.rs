//! The mailbox entry: [`Envelope`], its [`Body`], and the copy/borrow
//! [`Payload`] it may carry. One mailbox can hold user messages, timer
//! ticks, and system exit notices side by side without a `dyn` payload —
//! each is a variant of [`Body<M>`] instead of a separate envelope type.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{oneshot, OwnedSemaphorePermit};

use super::class::{ExitNotice, ExitReason, MessageClass};
use super::traits::Message;
use crate::ids::ActorId;

/// One-shot handle a borrow-send receiver uses to release the sender.
///
/// Dropping a `Releaser` without calling [`Releaser::release`] still wakes
/// the sender (a closed oneshot channel completes the awaiting receive with
/// an error) — a receiver exiting mid-borrow must not leave the sender stuck.
#[derive(Debug)]
pub struct Releaser(Option<oneshot::Sender<()>>);

impl Releaser {
    pub(crate) fn new(tx: oneshot::Sender<()>) -> Self {
        Releaser(Some(tx))
    }

    /// Signal the sender that the borrowed payload is no longer in use.
    pub fn release(mut self) {
        if let Some(tx) = self.0.take() {
            let _ = tx.send(());
        }
    }
}

/// How a message's payload crosses from sender to receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendMode {
    /// The payload is cloned into a pool slot the receiver owns outright;
    /// bounded by the shared payload pool, fails with `Status::nomem` when
    /// it's exhausted.
    Copy,
    /// The payload is shared by reference; the sender suspends until the
    /// receiver calls `Releaser::release`.
    Borrow,
}

/// A message payload, either pool-backed (copy mode) or shared by
/// reference with the sender suspended until release (borrow mode).
#[derive(Debug)]
pub enum Payload<M: Message> {
    /// Copy mode: the payload is owned outright by the receiver. The
    /// semaphore permit stands in for a fixed-capacity payload pool slot
    /// and is released back to the pool when this value is dropped.
    Owned {
        value: M,
        _permit: OwnedSemaphorePermit,
    },
    /// Borrow mode: the payload is shared with the sender, who remains
    /// suspended until the receiver calls [`Releaser::release`].
    Borrowed { value: Arc<M>, release: Releaser },
}

impl<M: Message> Payload<M> {
    /// Borrow the payload's contents regardless of mode.
    pub fn get(&self) -> &M {
        match self {
            Payload::Owned { value, .. } => value,
            Payload::Borrowed { value, .. } => value,
        }
    }

    /// Consume a copy-mode payload, returning the owned value. Panics if
    /// called on a borrowed payload — callers that need to support both
    /// should use [`Payload::get`] plus [`Payload::release`].
    pub fn into_owned(self) -> M {
        match self {
            Payload::Owned { value, .. } => value,
            Payload::Borrowed { .. } => {
                panic!("into_owned called on a borrow-mode payload; use get()/release() instead")
            }
        }
    }

    /// Release the payload: for borrow mode this wakes the sender; for
    /// copy mode it drops the pool permit. Either way the payload is
    /// consumed.
    pub fn release(self) {
        if let Payload::Borrowed { release, .. } = self {
            release.release();
        }
        // Owned permit drops here, freeing the pool slot.
    }
}

/// The content of a mailbox slot: a user message, a timer tick, or a
/// system exit notice.
#[derive(Debug)]
pub enum Body<M: Message> {
    Normal(Payload<M>),
    Timer,
    Exit { actor: ActorId, reason: ExitReason },
}

/// A mailbox entry in arrival order.
#[derive(Debug)]
pub struct Envelope<M: Message> {
    pub sender: ActorId,
    pub tag: u32,
    pub body: Body<M>,
    pub timestamp: DateTime<Utc>,
}

impl<M: Message> Envelope<M> {
    pub(crate) fn new(sender: ActorId, tag: u32, body: Body<M>) -> Self {
        Envelope {
            sender,
            tag,
            body,
            timestamp: Utc::now(),
        }
    }

    /// The entry's class, derived from its body.
    pub fn class(&self) -> MessageClass {
        match &self.body {
            Body::Normal(_) => MessageClass::Normal,
            Body::Timer => MessageClass::Timer,
            Body::Exit { .. } => MessageClass::System,
        }
    }

    /// True for a timer-tick entry.
    pub fn is_timer(&self) -> bool {
        matches!(self.body, Body::Timer)
    }

    /// True for a system exit notice.
    pub fn is_exit(&self) -> bool {
        matches!(self.body, Body::Exit { .. })
    }

    /// Decode an exit notice, if this entry carries one.
    pub fn decode_exit(&self) -> Option<ExitNotice> {
        match self.body {
            Body::Exit { actor, reason } => Some(ExitNotice { actor, reason }),
            _ => None,
        }
    }

    /// Borrow the user payload, if this is a normal message.
    pub fn payload(&self) -> Option<&M> {
        match &self.body {
            Body::Normal(p) => Some(p.get()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc as StdArc;
    use tokio::sync::Semaphore;

    #[derive(Debug, Clone)]
    struct Msg(u32);

    impl Message for Msg {
        const MESSAGE_TYPE: &'static str = "msg";
    }

    #[tokio::test]
    async fn owned_payload_roundtrips() {
        let sem = StdArc::new(Semaphore::new(1));
        let permit = sem.acquire_owned().await.unwrap();
        let env = Envelope::new(
            ActorId::FIRST_DYNAMIC,
            1,
            Body::Normal(Payload::Owned {
                value: Msg(42),
                _permit: permit,
            }),
        );
        assert_eq!(env.class(), MessageClass::Normal);
        assert_eq!(env.payload().unwrap().0, 42);
    }

    #[tokio::test]
    async fn borrowed_payload_release_wakes_sender() {
        let (tx, rx) = oneshot::channel();
        let env = Envelope::<Msg>::new(
            ActorId::FIRST_DYNAMIC,
            0,
            Body::Normal(Payload::Borrowed {
                value: StdArc::new(Msg(7)),
                release: Releaser::new(tx),
            }),
        );
        let Body::Normal(payload) = env.body else {
            unreachable!()
        };
        payload.release();
        assert!(rx.await.is_ok());
    }

    #[test]
    fn timer_and_exit_entries_classify_correctly() {
        let timer = Envelope::<Msg>::new(ActorId::TIMER, 5, Body::Timer);
        assert!(timer.is_timer());
        assert_eq!(timer.class(), MessageClass::Timer);

        let exit = Envelope::<Msg>::new(
            ActorId::SYSTEM,
            0,
            Body::Exit {
                actor: ActorId::FIRST_DYNAMIC,
                reason: ExitReason::Normal,
            },
        );
        assert!(exit.is_exit());
        assert_eq!(exit.decode_exit().unwrap().reason, ExitReason::Normal);
    }
}
