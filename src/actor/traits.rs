//! The `Actor` trait and its lifecycle vocabulary: `pre_start`, `run`,
//! `post_stop`, `on_error`. This runtime gives the body a single `run`
//! entry point instead of a framework-owned handle-one-message loop,
//! because actors here call `recv`/`recv_selective` directly and at
//! arbitrary points (to implement request/reply correlation and `sleep`),
//! which a handle-one-message-per-call shape can't express.

use async_trait::async_trait;
use std::error::Error as StdError;

use super::context::ActorContext;
use crate::message::Message;

/// What the driver does after `on_error` reports a failure from `run`.
/// Carries no restart-policy bookkeeping of its own — that lives in
/// [`crate::supervise`] instead, driven off link/monitor notices rather
/// than in-process error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    /// Call `run` again from scratch without re-running `pre_start`.
    Resume,
    /// Run `post_stop`, reset, then `pre_start` and `run` again.
    Restart,
    /// Run `post_stop` and exit with [`crate::message::ExitReason::Crash`].
    Stop,
    /// Same effect as `Stop` here — there is no supervisor tree above a
    /// bare actor to escalate to; a linked or monitoring actor observes
    /// the crash instead.
    Escalate,
}

/// A schedulable unit of computation with a private mailbox.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use moterun::actor::{Actor, ActorContext};
/// use moterun::message::{ExitReason, Message};
///
/// #[derive(Debug, Clone)]
/// struct Ping;
/// impl Message for Ping {
///     const MESSAGE_TYPE: &'static str = "ping";
/// }
///
/// struct Counter(u32);
///
/// #[async_trait(?Send)]
/// impl Actor for Counter {
///     type Message = Ping;
///     type Error = std::convert::Infallible;
///
///     async fn run(&mut self, ctx: &mut ActorContext<Ping>) -> Result<(), Self::Error> {
///         loop {
///             let _ = ctx.recv().await;
///             self.0 += 1;
///             if self.0 >= 3 {
///                 ctx.exit(ExitReason::Normal);
///                 return Ok(());
///             }
///         }
///     }
/// }
/// ```
#[async_trait(?Send)]
pub trait Actor: 'static {
    type Message: Message;
    type Error: StdError + 'static;

    /// The actor's main loop. Returning `Ok(())` without having called
    /// [`ActorContext::exit`] is reported as [`crate::message::ExitReason::Crash`] —
    /// a clean stop is something the body must opt into explicitly.
    async fn run(&mut self, ctx: &mut ActorContext<Self::Message>) -> Result<(), Self::Error>;

    /// Runs once before the first call to `run`. An `Err` here aborts
    /// startup; the actor exits with `Crash` without `run` ever being
    /// called.
    async fn pre_start(&mut self, _ctx: &mut ActorContext<Self::Message>) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Runs once after `run` returns or is abandoned, win or lose. Its own
    /// errors are swallowed (logged, not propagated) — there is no further
    /// lifecycle stage left to report them to.
    async fn post_stop(&mut self, _ctx: &mut ActorContext<Self::Message>) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Decide what to do after `run` (or `pre_start`, on restart) returns
    /// an error. The default stops the actor.
    async fn on_error(&mut self, _error: Self::Error, _ctx: &mut ActorContext<Self::Message>) -> ErrorAction {
        ErrorAction::Stop
    }
}
