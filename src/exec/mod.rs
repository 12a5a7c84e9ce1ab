//! The priority-with-round-robin executor.
//!
//! Tokio's own scheduler has no priority hooks, so this runtime drives
//! actor futures by hand instead of reaching for `tokio::spawn`.
//! Each actor is a `Pin<Box<dyn Future<Output = ExitReason>>>` polled with
//! a custom [`std::task::Wake`] that pushes the actor's id onto an
//! unbounded channel instead of rescheduling it on a thread pool — there
//! is only ever one thread here.

mod waker;

pub use waker::ActorWaker;

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, Semaphore};

use crate::actor::{ActorContext, ActorTable, ControlBlock};
use crate::bus::BusTable;
use crate::ids::ActorId;
use crate::log::{Event, LogSink};
use crate::message::{ExitReason, Message};
use crate::priority::ActorPriority;
use crate::supervise;
use crate::timer::TimerTable;

/// What the executor does when every live actor is blocked and no timer
/// is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlockPolicy {
    /// Wait `grace` for any wakeup; if none arrives, log and stop the
    /// executor's run loop.
    LogAndStop,
    /// Wait indefinitely. Only sensible when an external process (signal
    /// handler, attached debugger) can still act on the runtime.
    WaitForever,
}

/// A deferred actor allocation, submitted by [`ActorContext::spawn`] and
/// applied by the executor between scheduling rounds — needed because the
/// context that wants to spawn is itself borrowed from inside a future
/// the executor currently has pinned and is polling.
pub(crate) struct SpawnRequest<M: Message> {
    pub name: Option<String>,
    pub priority: ActorPriority,
    #[allow(clippy::type_complexity)]
    pub make_future: Box<dyn FnOnce(ActorContext<M>) -> Pin<Box<dyn Future<Output = ExitReason>>>>,
    pub reply: oneshot::Sender<ActorId>,
}

/// Handles shared between the executor and every actor's context.
#[derive(Clone)]
pub(crate) struct SharedHandles<M: Message> {
    pub table: Rc<RefCell<ActorTable<M>>>,
    pub timers: Rc<RefCell<TimerTable>>,
    pub buses: Rc<RefCell<BusTable>>,
    pub payload_pool: Arc<Semaphore>,
    pub wake_tx: mpsc::UnboundedSender<ActorId>,
    pub spawn_tx: mpsc::UnboundedSender<SpawnRequest<M>>,
}

pub struct Executor<M: Message> {
    shared: SharedHandles<M>,
    futures: HashMap<ActorId, Pin<Box<dyn Future<Output = ExitReason>>>>,
    ready: [VecDeque<ActorId>; ActorPriority::LEVELS],
    wake_rx: mpsc::UnboundedReceiver<ActorId>,
    spawn_rx: mpsc::UnboundedReceiver<SpawnRequest<M>>,
    deadlock_policy: DeadlockPolicy,
    deadlock_grace: Duration,
    log_sink: Rc<dyn LogSink>,
}

impl<M: Message> Executor<M> {
    pub fn new(
        actor_capacity: usize,
        timer_capacity: usize,
        bus_capacity: usize,
        payload_pool_capacity: usize,
        deadlock_policy: DeadlockPolicy,
        deadlock_grace: Duration,
        log_sink: Rc<dyn LogSink>,
    ) -> Self {
        let (wake_tx, wake_rx) = mpsc::unbounded_channel();
        let (spawn_tx, spawn_rx) = mpsc::unbounded_channel();
        Executor {
            shared: SharedHandles {
                table: Rc::new(RefCell::new(ActorTable::new(actor_capacity))),
                timers: Rc::new(RefCell::new(TimerTable::new(timer_capacity))),
                buses: Rc::new(RefCell::new(BusTable::new(bus_capacity))),
                payload_pool: Arc::new(Semaphore::new(payload_pool_capacity)),
                wake_tx,
                spawn_tx,
            },
            futures: HashMap::new(),
            ready: Default::default(),
            wake_rx,
            spawn_rx,
            deadlock_policy,
            deadlock_grace,
            log_sink,
        }
    }

    /// Forcefully drop every pending actor future, ending [`Executor::run`]
    /// on its next loop iteration without waiting for actors to exit on
    /// their own. Already-delivered mailbox state is discarded along with
    /// the futures — this is a hard stop, not a graceful one.
    pub fn shutdown(&mut self) {
        self.futures.clear();
    }

    /// Drain channels without polling any actor — used by a caller that
    /// wants spawn replies and wakeups flushed (e.g. between test phases)
    /// without advancing the schedule.
    pub fn cleanup(&mut self) {
        self.drain_spawn_requests();
        self.drain_wakeups();
    }

    pub(crate) fn shared(&self) -> SharedHandles<M> {
        self.shared.clone()
    }

    /// Allocate a new actor and place it on its priority's ready queue.
    /// Used both for the application's initial `Runtime::spawn` calls
    /// (made before `run` starts) and, via [`SpawnRequest`], for actors
    /// spawning children of their own.
    pub(crate) fn insert_actor(
        &mut self,
        name: Option<String>,
        priority: ActorPriority,
        make_future: impl FnOnce(ActorContext<M>) -> Pin<Box<dyn Future<Output = ExitReason>>>,
    ) -> Result<ActorId, crate::status::Status> {
        let id = ActorId::next();
        {
            let mut table = self.shared.table.borrow_mut();
            table.insert(ControlBlock::new(id, name, priority, 0))?;
        }
        let ctx = ActorContext::new(id, self.shared.clone());
        let future = make_future(ctx);
        self.futures.insert(id, future);
        self.ready[priority.rank()].push_back(id);
        Ok(id)
    }

    fn drain_spawn_requests(&mut self) {
        while let Ok(req) = self.spawn_rx.try_recv() {
            match self.insert_actor(req.name, req.priority, req.make_future) {
                Ok(id) => {
                    let _ = req.reply.send(id);
                }
                Err(_) => {
                    // Dropping `req.reply` completes the waiting spawn
                    // call's oneshot with an error, which it reports as
                    // `Status::nomem`.
                }
            }
        }
    }

    fn pop_ready(&mut self) -> Option<ActorId> {
        for level in self.ready.iter_mut() {
            if let Some(id) = level.pop_front() {
                return Some(id);
            }
        }
        None
    }

    fn mark_ready(&mut self, id: ActorId) {
        let priority = match self.shared.table.borrow().get(id) {
            Some(block) => block.priority,
            None => return,
        };
        self.ready[priority.rank()].push_back(id);
    }

    fn drain_wakeups(&mut self) {
        while let Ok(id) = self.wake_rx.try_recv() {
            self.mark_ready(id);
        }
    }

    fn fire_timers(&mut self) {
        let fired = self.shared.timers.borrow_mut().drain_due(tokio::time::Instant::now());
        for (owner, tag) in fired {
            let mut table = self.shared.table.borrow_mut();
            if let Some(block) = table.get_mut(owner) {
                block
                    .mailbox
                    .push(crate::message::Envelope::new(ActorId::TIMER, tag, crate::message::Body::Timer));
            }
        }
    }

    /// Poll one actor once. Returns its exit reason if this poll resolved
    /// the future.
    fn poll_actor(&mut self, id: ActorId) -> Option<ExitReason> {
        let Some(future) = self.futures.get_mut(&id) else {
            return None;
        };
        let waker: Waker = Arc::new(ActorWaker::new(id, self.shared.wake_tx.clone())).into();
        let mut cx = Context::from_waker(&waker);
        match future.as_mut().poll(&mut cx) {
            Poll::Ready(reason) => Some(reason),
            Poll::Pending => None,
        }
    }

    fn finish_actor(&mut self, id: ActorId, reason: ExitReason) {
        self.futures.remove(&id);
        self.shared.table.borrow_mut().mark_dead(id);
        supervise::notify_death(&mut self.shared.table.borrow_mut(), id, reason);
        // Peers just notified may be blocked in `recv`; their mailbox push
        // already woke them through the same waker channel every other
        // send uses, so no extra bookkeeping is needed here.
        self.log_sink.record(&Event::ActorExited { id, reason });
        self.shared.table.borrow_mut().free(id);
    }

    async fn idle_wait(&mut self) {
        let deadline = self.shared.timers.borrow().next_deadline();
        match (deadline, self.deadlock_policy) {
            (Some(when), _) => {
                tokio::select! {
                    maybe_id = self.wake_rx.recv() => {
                        if let Some(id) = maybe_id { self.mark_ready(id); }
                    }
                    _ = tokio::time::sleep_until(when) => {
                        self.fire_timers();
                    }
                }
            }
            (None, DeadlockPolicy::WaitForever) => {
                if let Some(id) = self.wake_rx.recv().await {
                    self.mark_ready(id);
                }
            }
            (None, DeadlockPolicy::LogAndStop) => {
                tokio::select! {
                    maybe_id = self.wake_rx.recv() => {
                        if let Some(id) = maybe_id { self.mark_ready(id); }
                    }
                    _ = tokio::time::sleep(self.deadlock_grace) => {
                        self.log_sink.record(&Event::Deadlock { pending_actors: self.futures.len() });
                        self.futures.clear();
                    }
                }
            }
        }
    }

    /// Run until every actor has exited, or the deadlock policy stops the
    /// loop early.
    pub async fn run(&mut self) {
        loop {
            self.drain_spawn_requests();
            self.drain_wakeups();

            if let Some(id) = self.pop_ready() {
                if let Some(reason) = self.poll_actor(id) {
                    self.finish_actor(id, reason);
                }
                continue;
            }

            if self.futures.is_empty() {
                break;
            }

            self.idle_wait().await;
        }
    }
}
