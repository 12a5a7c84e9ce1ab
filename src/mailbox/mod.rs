//! An actor's private, FIFO mailbox.
//!
//! A single owned queue, since mailboxes are never shared across threads:
//! every actor owns its mailbox outright, and other actors reach it only
//! indirectly through [`crate::actor::ActorTable`]. Blocking is
//! implemented by hand — no tokio channel — so that an empty `recv` can
//! register the exact [`std::task::Waker`] the priority executor is
//! polling this actor with.

use std::collections::VecDeque;
use std::task::Waker;

use crate::message::{Envelope, Message, MessageClass};

/// A single actor's mailbox: an arrival-ordered queue plus the waker to
/// notify when a blocked [`crate::actor::ActorContext::recv`] gets data.
pub struct Mailbox<M: Message> {
    queue: VecDeque<Envelope<M>>,
    waiting: Option<Waker>,
}

impl<M: Message> Mailbox<M> {
    pub fn new() -> Self {
        Mailbox {
            queue: VecDeque::new(),
            waiting: None,
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Append an entry and, if a receiver is blocked in `recv`, wake it.
    /// Returns `true` if a waiting receiver was woken.
    pub fn push(&mut self, envelope: Envelope<M>) -> bool {
        self.queue.push_back(envelope);
        if let Some(waker) = self.waiting.take() {
            waker.wake();
            true
        } else {
            false
        }
    }

    /// Pop the oldest entry, if any.
    pub fn try_pop(&mut self) -> Option<Envelope<M>> {
        self.queue.pop_front()
    }

    /// Register a waker to be notified the next time [`Mailbox::push`] is
    /// called. Used by `recv`'s `Future` impl when the queue is empty.
    pub fn register_waiting(&mut self, waker: Waker) {
        self.waiting = Some(waker);
    }

    /// Scan in arrival order for the first entry matching `pred`, removing
    /// only that entry and leaving the rest untouched — the primitive
    /// behind `recv_selective`, `sleep`, and `recv_timeout`.
    pub fn remove_first_matching<F>(&mut self, mut pred: F) -> Option<Envelope<M>>
    where
        F: FnMut(&Envelope<M>) -> bool,
    {
        let idx = self.queue.iter().position(|e| pred(e))?;
        self.queue.remove(idx)
    }

    /// Count entries of a given class, mostly useful in tests.
    pub fn count_class(&self, class: MessageClass) -> usize {
        self.queue.iter().filter(|e| e.class() == class).count()
    }
}

impl<M: Message> Default for Mailbox<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ActorId;
    use crate::message::Body;

    #[derive(Debug, Clone)]
    struct M(u32);
    impl Message for M {
        const MESSAGE_TYPE: &'static str = "m";
    }

    fn timer_env(tag: u32) -> Envelope<M> {
        Envelope::new(ActorId::TIMER, tag, Body::Timer)
    }

    #[test]
    fn fifo_order_preserved() {
        let mut mb = Mailbox::<M>::new();
        mb.push(timer_env(1));
        mb.push(timer_env(2));
        mb.push(timer_env(3));
        assert_eq!(mb.try_pop().unwrap().tag, 1);
        assert_eq!(mb.try_pop().unwrap().tag, 2);
        assert_eq!(mb.try_pop().unwrap().tag, 3);
        assert!(mb.try_pop().is_none());
    }

    #[test]
    fn selective_receive_leaves_others_in_place() {
        let mut mb = Mailbox::<M>::new();
        mb.push(timer_env(1));
        mb.push(timer_env(2));
        mb.push(timer_env(3));
        let found = mb.remove_first_matching(|e| e.tag == 2).unwrap();
        assert_eq!(found.tag, 2);
        assert_eq!(mb.try_pop().unwrap().tag, 1);
        assert_eq!(mb.try_pop().unwrap().tag, 3);
    }

    #[test]
    fn push_into_empty_mailbox_reports_no_waiter() {
        let mut mb = Mailbox::<M>::new();
        assert!(!mb.push(timer_env(1)));
    }
}
