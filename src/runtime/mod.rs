//! The top-level façade applications hold: configuration and the
//! `Runtime` that owns the executor.

use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::time::Duration;

pub use crate::exec::DeadlockPolicy;

use crate::actor::{Actor, ActorContext};
use crate::exec::Executor;
use crate::ids::ActorId;
use crate::log::{ConsoleSink, LogSink};
use crate::message::{ExitReason, Message};
use crate::priority::ActorPriority;
use crate::status::Status;

/// Logging configuration: which sink receives runtime lifecycle events.
/// Defaults to a [`ConsoleSink`] rather than silence.
pub struct LogConfig {
    pub sink: Rc<dyn LogSink>,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            sink: Rc::new(ConsoleSink),
        }
    }
}

/// Fixed-capacity pool sizes and scheduling policy for one [`Runtime`].
/// Every pool here is sized up front, never grown, keeping the runtime's
/// memory footprint fixed for the lifetime of the process.
pub struct Config {
    pub actor_capacity: usize,
    pub timer_capacity: usize,
    pub bus_capacity: usize,
    pub payload_pool_capacity: usize,
    pub deadlock_policy: DeadlockPolicy,
    pub deadlock_grace: Duration,
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            actor_capacity: 256,
            timer_capacity: 64,
            bus_capacity: 16,
            payload_pool_capacity: 256,
            deadlock_policy: DeadlockPolicy::LogAndStop,
            deadlock_grace: Duration::from_secs(5),
            log: LogConfig::default(),
        }
    }
}

/// Owns the executor and every shared table behind it. A process
/// typically creates one `Runtime`, spawns its root actors, then calls
/// [`Runtime::run`] and awaits it to completion on a `current_thread`
/// Tokio runtime.
pub struct Runtime<M: Message> {
    executor: Executor<M>,
    log_sink: Rc<dyn LogSink>,
}

impl<M: Message> Runtime<M> {
    /// Build a runtime from its configuration. Named `init` rather than
    /// `new` to match the rest of the lifecycle surface (`run`, `shutdown`,
    /// `cleanup`) reading as a sequence of verbs.
    pub fn init(config: Config) -> Self {
        let log_sink = config.log.sink;
        Runtime {
            executor: Executor::new(
                config.actor_capacity,
                config.timer_capacity,
                config.bus_capacity,
                config.payload_pool_capacity,
                config.deadlock_policy,
                config.deadlock_grace,
                log_sink.clone(),
            ),
            log_sink,
        }
    }

    /// Spawn a root actor — one with no parent, typically called before
    /// [`Runtime::run`] starts (spawning from inside a running actor goes
    /// through [`ActorContext::spawn`] instead). Uses the actor's default
    /// priority of [`ActorPriority::Normal`]; use [`Runtime::spawn_with`]
    /// to pick a priority or name.
    pub fn spawn<A>(&mut self, actor: A) -> Result<ActorId, Status>
    where
        A: Actor<Message = M>,
    {
        self.spawn_with(actor, ActorPriority::Normal, None)
    }

    /// Spawn a root actor with an explicit priority and optional name.
    pub fn spawn_with<A>(&mut self, actor: A, priority: ActorPriority, name: Option<String>) -> Result<ActorId, Status>
    where
        A: Actor<Message = M>,
    {
        let log_name = name.clone();
        let id = self.executor.insert_actor(name, priority, move |ctx: ActorContext<M>| -> Pin<Box<dyn Future<Output = ExitReason>>> {
            Box::pin(crate::actor::drive::drive(actor, ctx))
        })?;
        self.log_sink.record(&crate::log::Event::ActorSpawned { id, name: log_name });
        Ok(id)
    }

    /// Run the scheduler until every actor has exited (or the deadlock
    /// policy stops it early).
    pub async fn run(&mut self) {
        self.executor.run().await;
    }

    /// Forcefully stop the scheduler: every pending actor future is
    /// dropped without running its `post_stop`. For a cooperative stop,
    /// have a root actor `ctx.exit()` the others via link/monitor instead.
    pub fn shutdown(&mut self) {
        self.executor.shutdown();
    }

    /// Flush spawn replies and wakeups queued by actors without advancing
    /// the schedule. Exposed for callers (tests, embedders) that drive the
    /// executor a step at a time instead of calling [`Runtime::run`].
    pub fn cleanup(&mut self) {
        self.executor.cleanup();
    }

    /// How many actors are still alive. Mostly useful in tests and for a
    /// supervising process deciding whether a clean shutdown has finished.
    pub fn actor_count(&self) -> usize {
        self.executor.shared().table.borrow().len()
    }
}
