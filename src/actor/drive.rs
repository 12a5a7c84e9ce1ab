//! Turns an `Actor` plus its `ActorContext` into the
//! `Future<Output = ExitReason>` the executor actually polls.
//!
//! This is the one place that notices a body that returned without
//! calling `exit` and reports it as a crash rather than a normal exit.

use super::context::ActorContext;
use super::traits::{Actor, ErrorAction};
use crate::message::{ExitReason, Message};

pub(crate) async fn drive<A>(mut actor: A, mut ctx: ActorContext<A::Message>) -> ExitReason
where
    A: Actor,
    A::Message: Message,
{
    if let Err(e) = actor.pre_start(&mut ctx).await {
        let _ = actor.on_error(e, &mut ctx).await;
        return ExitReason::Crash;
    }

    loop {
        match actor.run(&mut ctx).await {
            Ok(()) => break,
            Err(e) => match actor.on_error(e, &mut ctx).await {
                ErrorAction::Resume => continue,
                ErrorAction::Restart => {
                    let _ = actor.post_stop(&mut ctx).await;
                    ctx.reset_exit();
                    if actor.pre_start(&mut ctx).await.is_err() {
                        return ExitReason::Crash;
                    }
                    continue;
                }
                ErrorAction::Stop | ErrorAction::Escalate => {
                    ctx.exit(ExitReason::Crash);
                    break;
                }
            },
        }
    }

    let _ = actor.post_stop(&mut ctx).await;
    ctx.take_exit_reason()
}
