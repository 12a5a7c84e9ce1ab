//! Mailbox entry classification and exit reasons.

use serde::{Deserialize, Serialize};

use crate::ids::ActorId;

/// What kind of entry a mailbox slot holds: a normal message, a timer
/// tick, or a system exit notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageClass {
    Normal,
    Timer,
    System,
}

/// Why an actor terminated.
///
/// `Crash` is reported whenever an actor's driving future resolves without
/// [`crate::actor::ActorContext::exit`] having been called first — including
/// an `Err` return from the actor body or a caught panic. The code that
/// polls an actor's future to completion is the one place positioned to
/// notice a silent fall-through and treat it as a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    Normal,
    Crash,
    Killed,
}

/// The decoded payload of a `Body::Exit` mailbox entry, delivered to
/// linked and monitoring actors on a peer's death.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitNotice {
    pub actor: ActorId,
    pub reason: ExitReason,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_notice_carries_actor_and_reason() {
        let notice = ExitNotice {
            actor: ActorId::FIRST_DYNAMIC,
            reason: ExitReason::Crash,
        };
        assert_eq!(notice.reason, ExitReason::Crash);
    }
}
