//! The handle an actor's body uses to talk to the rest of the runtime:
//! self id, mailbox receive (`recv`, `recv_timeout`, `recv_selective`),
//! sending, timers, links/monitors, bus access, and spawning — since an
//! actor body is a single freeform `run` loop rather than a
//! framework-owned message dispatch.

use std::cell::Cell;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::oneshot;

use crate::bus::ReadWait;
use crate::exec::SpawnRequest;
use crate::ids::{ActorId, BusId, MonitorRef, TimerId};
use crate::message::{Body, Envelope, ExitReason, Message, Payload, Releaser, SendMode};
use crate::priority::ActorPriority;
use crate::status::Status;
use crate::supervise;

use super::traits::Actor;

pub(crate) use crate::exec::SharedHandles;

/// Per-actor handle into the shared runtime state. Cheap to hold onto for
/// an actor's entire lifetime; every operation either touches
/// `Rc<RefCell<_>>`-shared tables directly or goes through a channel to
/// the executor.
pub struct ActorContext<M: Message> {
    id: ActorId,
    shared: SharedHandles<M>,
    exited: Cell<bool>,
    /// Counts down from `u32::MAX`, used only to tag timers this context
    /// schedules for its own internal use (`sleep`) with a value a caller
    /// picking tags starting from zero is never going to collide with.
    internal_tag: Cell<u32>,
}

impl<M: Message> ActorContext<M> {
    pub(crate) fn new(id: ActorId, shared: SharedHandles<M>) -> Self {
        ActorContext {
            id,
            shared,
            exited: Cell::new(false),
            internal_tag: Cell::new(u32::MAX),
        }
    }

    fn next_internal_tag(&self) -> u32 {
        let t = self.internal_tag.get();
        self.internal_tag.set(t.wrapping_sub(1));
        t
    }

    pub fn self_id(&self) -> ActorId {
        self.id
    }

    /// Record the actor's intended exit reason. The actual termination
    /// happens when `run` returns; a `run` that returns without ever
    /// calling `exit` is reported as `ExitReason::Crash` regardless.
    pub fn exit(&self, reason: ExitReason) {
        self.exited.set(true);
        if let Some(block) = self.shared.table.borrow_mut().get_unchecked_mut(self.id) {
            block.exit_requested = Some(reason);
        }
    }

    pub fn exit_requested(&self) -> bool {
        self.exited.get()
    }

    /// Whether `id` is still a live entry in the actor table.
    pub fn is_alive(&self, id: ActorId) -> bool {
        self.shared.table.borrow().get(id).is_some()
    }

    /// Resolve the reason `run`'s caller should report: whatever `exit`
    /// recorded, or `Crash` if it was never called.
    pub(crate) fn take_exit_reason(&self) -> ExitReason {
        self.shared
            .table
            .borrow_mut()
            .get_unchecked_mut(self.id)
            .and_then(|b| b.exit_requested.take())
            .unwrap_or(ExitReason::Crash)
    }

    pub(crate) fn reset_exit(&self) {
        self.exited.set(false);
        if let Some(block) = self.shared.table.borrow_mut().get_unchecked_mut(self.id) {
            block.exit_requested = None;
        }
    }

    /// Yield once, letting equal- or higher-priority ready actors run
    /// before this one is polled again.
    pub fn yield_now(&self) -> impl Future<Output = ()> + '_ {
        YieldNow { yielded: false }
    }

    // ---- mailbox ---------------------------------------------------

    /// Receive the next entry, of any class, in arrival order.
    pub fn recv(&self) -> Recv<'_, M> {
        Recv { ctx: self, pred: None }
    }

    /// Receive the first entry matching `pred`, skipping over (and
    /// leaving in place) anything that doesn't match — the primitive
    /// behind request/reply correlation and `sleep`.
    pub fn recv_selective<F>(&self, pred: F) -> Recv<'_, M>
    where
        F: FnMut(&Envelope<M>) -> bool + 'static,
    {
        Recv {
            ctx: self,
            pred: Some(Box::new(pred)),
        }
    }

    /// Receive with a deadline; resolves to `Status::timeout` if nothing
    /// arrives first.
    pub async fn recv_timeout(&self, timeout: Duration) -> Result<Envelope<M>, Status> {
        tokio::select! {
            envelope = self.recv() => Ok(envelope),
            _ = tokio::time::sleep(timeout) => Err(Status::timeout("recv_timeout expired")),
        }
    }

    /// Suspend for `duration` without giving up mailbox ordering: backed
    /// by a one-shot timer whose tick is selectively received and
    /// discarded, so any other messages that arrive meanwhile stay queued
    /// untouched.
    pub async fn sleep(&self, duration: Duration) {
        let tag = self.next_internal_tag();
        match self.after(duration, tag) {
            Ok(_) => {
                let _ = self.recv_selective(move |e| e.is_timer() && e.tag == tag).await;
            }
            Err(_) => tokio::time::sleep(duration).await,
        }
    }

    // ---- sending -----------------------------------------------------

    /// Send `value` to `to`. Copy mode clones into a pool slot the
    /// receiver owns outright and fails fast with `Status::nomem` when the
    /// shared payload pool is exhausted; borrow mode shares `value` by
    /// reference and suspends the sender until the receiver releases it.
    pub async fn send(&self, to: ActorId, tag: u32, value: M, mode: SendMode) -> Status {
        match mode {
            SendMode::Copy => {
                let permit = match self.shared.payload_pool.clone().try_acquire_owned() {
                    Ok(permit) => permit,
                    Err(_) => return Status::nomem("payload pool exhausted"),
                };
                let envelope = Envelope::new(
                    self.id,
                    tag,
                    Body::Normal(Payload::Owned { value, _permit: permit }),
                );
                self.deliver(to, envelope)
            }
            SendMode::Borrow => {
                let (release_tx, release_rx) = oneshot::channel();
                let envelope = Envelope::new(
                    self.id,
                    tag,
                    Body::Normal(Payload::Borrowed {
                        value: Arc::new(value),
                        release: Releaser::new(release_tx),
                    }),
                );
                let status = self.deliver(to, envelope);
                if !status.is_ok() {
                    return status;
                }
                match release_rx.await {
                    Ok(()) => Status::OK,
                    Err(_) => Status::closed("receiver dropped borrow without release"),
                }
            }
        }
    }

    fn deliver(&self, to: ActorId, envelope: Envelope<M>) -> Status {
        match self.shared.table.borrow_mut().get_mut(to) {
            Some(block) => {
                block.mailbox.push(envelope);
                Status::OK
            }
            None => Status::closed("target actor does not exist"),
        }
    }

    // ---- timers --------------------------------------------------------

    pub fn after(&self, delay: Duration, tag: u32) -> Result<TimerId, Status> {
        self.shared.timers.borrow_mut().after(self.id, delay, tag)
    }

    pub fn every(&self, period: Duration, tag: u32) -> Result<TimerId, Status> {
        self.shared.timers.borrow_mut().every(self.id, period, tag)
    }

    pub fn cancel_timer(&self, id: TimerId) -> Status {
        self.shared.timers.borrow_mut().cancel(id)
    }

    // ---- links and monitors --------------------------------------------

    pub fn link(&self, other: ActorId) -> Status {
        supervise::link(&mut self.shared.table.borrow_mut(), self.id, other)
    }

    pub fn unlink(&self, other: ActorId) -> Status {
        supervise::unlink(&mut self.shared.table.borrow_mut(), self.id, other)
    }

    pub fn monitor(&self, target: ActorId) -> Result<MonitorRef, Status> {
        supervise::monitor(&mut self.shared.table.borrow_mut(), self.id, target)
    }

    pub fn demonitor(&self, monref: MonitorRef) -> Status {
        supervise::demonitor(&mut self.shared.table.borrow_mut(), monref)
    }

    // ---- bus -------------------------------------------------------------

    pub fn bus_create(&self, config: crate::bus::BusConfig) -> Result<BusId, Status> {
        self.shared.buses.borrow_mut().create(config)
    }

    pub fn bus_destroy(&self, id: BusId) -> Status {
        self.shared.buses.borrow_mut().destroy(id)
    }

    pub fn bus_subscribe(&self, id: BusId) -> Result<u32, Status> {
        self.shared.buses.borrow_mut().subscribe(id)
    }

    pub fn bus_unsubscribe(&self, id: BusId, reader: u32) -> Status {
        self.shared.buses.borrow_mut().unsubscribe(id, reader)
    }

    pub fn bus_publish(&self, id: BusId, payload: Bytes) -> Status {
        self.shared.buses.borrow_mut().publish(id, payload)
    }

    pub fn bus_read(&self, id: BusId, reader: u32) -> Result<Bytes, Status> {
        self.shared.buses.borrow_mut().read(id, reader)
    }

    pub fn bus_read_wait(&self, id: BusId, reader: u32) -> ReadWait {
        ReadWait::new(self.shared.buses.clone(), id, reader)
    }

    pub fn bus_entry_count(&self, id: BusId) -> Option<usize> {
        self.shared.buses.borrow().entry_count(id)
    }

    // ---- spawning ----------------------------------------------------

    /// Spawn a child actor. Resolves once the executor has allocated its
    /// id, which happens on the next scheduling round rather than
    /// synchronously, since the spawning context is itself borrowed from
    /// inside a future the executor is currently polling.
    pub async fn spawn<A>(&self, actor: A, priority: ActorPriority, name: Option<String>) -> Result<ActorId, Status>
    where
        A: Actor<Message = M>,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let request = SpawnRequest {
            name,
            priority,
            make_future: Box::new(move |ctx: ActorContext<M>| -> Pin<Box<dyn Future<Output = ExitReason>>> {
                Box::pin(super::drive::drive(actor, ctx))
            }),
            reply: reply_tx,
        };
        if self.shared.spawn_tx.send(request).is_err() {
            return Err(Status::closed("executor is shutting down"));
        }
        reply_rx.await.map_err(|_| Status::nomem("actor table at capacity"))
    }
}

/// `Future` impl behind `recv`/`recv_selective`.
pub struct Recv<'a, M: Message> {
    ctx: &'a ActorContext<M>,
    pred: Option<Box<dyn FnMut(&Envelope<M>) -> bool>>,
}

impl<'a, M: Message> Future for Recv<'a, M> {
    type Output = Envelope<M>;

    fn poll(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let mut table = this.ctx.shared.table.borrow_mut();
        let Some(block) = table.get_unchecked_mut(this.ctx.id) else {
            return Poll::Pending;
        };
        let found = match &mut this.pred {
            Some(pred) => block.mailbox.remove_first_matching(|e| pred(e)),
            None => block.mailbox.try_pop(),
        };
        match found {
            Some(envelope) => Poll::Ready(envelope),
            None => {
                block.mailbox.register_waiting(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        if self.yielded {
            Poll::Ready(())
        } else {
            self.yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}
