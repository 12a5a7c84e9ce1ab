//! Links and monitors: the two lifecycle-observation primitives built on
//! top of the actor table. No restart strategies or supervisor tree here,
//! just "tell me when this actor dies" in bidirectional (`link`) or
//! one-way (`monitor`) form, represented as plain `Vec`s on the control
//! block — adequate while link/monitor counts per actor stay small.

use crate::actor::ActorTable;
use crate::ids::{ActorId, MonitorRef};
use crate::message::{Body, Envelope, ExitReason, Message};
use crate::status::Status;

/// Link two actors bidirectionally. Either side's death notifies the
/// other. Linking an actor to itself, or linking twice, is rejected as
/// `Invalid` rather than silently deduplicated, so callers notice a bug.
pub fn link<M: Message>(table: &mut ActorTable<M>, a: ActorId, b: ActorId) -> Status {
    if a == b {
        return Status::invalid("an actor cannot link to itself");
    }
    if table.get(a).is_none() || table.get(b).is_none() {
        return Status::invalid("link target does not exist");
    }
    if table.get(a).unwrap().links.contains(&b) {
        return Status::invalid("link already exists");
    }
    table.get_mut(a).unwrap().links.push(b);
    table.get_mut(b).unwrap().links.push(a);
    Status::OK
}

/// Remove a bidirectional link. A no-op (reported `Invalid`) if the two
/// were not linked.
pub fn unlink<M: Message>(table: &mut ActorTable<M>, a: ActorId, b: ActorId) -> Status {
    let Some(block_a) = table.get_mut(a) else {
        return Status::invalid("unlink source does not exist");
    };
    let had = block_a.links.iter().position(|&id| id == b);
    let Some(pos) = had else {
        return Status::invalid("actors were not linked");
    };
    block_a.links.remove(pos);
    if let Some(block_b) = table.get_mut(b) {
        block_b.links.retain(|&id| id != a);
    }
    Status::OK
}

/// Install a one-way observer: `watcher` is notified when `target` dies.
/// Unlike `link`, `target` does not learn about `watcher`, and a watcher
/// may monitor the same target more than once (each call returns a
/// distinct ref).
///
/// The monitor entry lives on `target`'s control block rather than
/// `watcher`'s, so if `watcher` dies first its entry lingers on `target`
/// until `target` itself dies or is explicitly `demonitor`ed — delivery
/// to a reaped `watcher` slot is then just a harmless no-op in
/// `deliver_exit`.
pub fn monitor<M: Message>(table: &mut ActorTable<M>, watcher: ActorId, target: ActorId) -> Result<MonitorRef, Status> {
    if table.get(watcher).is_none() {
        return Err(Status::invalid("monitoring actor does not exist"));
    }
    if table.get(target).is_none() {
        return Err(Status::invalid("monitor target does not exist"));
    }
    let monref = MonitorRef::next();
    table.get_mut(target).unwrap().monitors.push((monref, watcher));
    table.register_monitor(monref, target);
    Ok(monref)
}

/// Remove a previously installed monitor. Reports `Invalid` if the ref is
/// unknown or the target already died and was reaped (the watcher already
/// received its exit notice by then, so there is nothing left to cancel).
pub fn demonitor<M: Message>(table: &mut ActorTable<M>, monref: MonitorRef) -> Status {
    let Some(target) = table.resolve_monitor(monref) else {
        return Status::invalid("unknown monitor ref");
    };
    table.forget_monitor(monref);
    match table.get_mut(target) {
        Some(block) => {
            block.monitors.retain(|(r, _)| *r != monref);
            Status::OK
        }
        None => Status::invalid("monitor target already reaped"),
    }
}

/// Deliver a dead actor's exit notice to its links and then its monitors,
/// in that fixed order, so the two groups never race in an unspecified
/// way. Called once, right after the actor's driving future resolves and
/// before its slot is freed.
pub fn notify_death<M: Message>(table: &mut ActorTable<M>, dead: ActorId, reason: ExitReason) {
    let Some(block) = table.get_unchecked(dead) else {
        return;
    };
    let links = block.links.clone();
    let monitors = block.monitors.clone();

    for peer in &links {
        deliver_exit(table, *peer, dead, reason);
        if let Some(peer_block) = table.get_unchecked_mut(*peer) {
            peer_block.links.retain(|&id| id != dead);
        }
    }
    for (monref, watcher) in &monitors {
        deliver_exit(table, *watcher, dead, reason);
        table.forget_monitor(*monref);
    }
}

fn deliver_exit<M: Message>(table: &mut ActorTable<M>, to: ActorId, dead: ActorId, reason: ExitReason) {
    if let Some(block) = table.get_unchecked_mut(to) {
        block.mailbox.push(Envelope::new(
            ActorId::SYSTEM,
            0,
            Body::Exit { actor: dead, reason },
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::priority::ActorPriority;
    use crate::actor::ControlBlock;

    #[derive(Debug, Clone)]
    struct M;
    impl Message for M {
        const MESSAGE_TYPE: &'static str = "m";
    }

    fn spawn(table: &mut ActorTable<M>) -> ActorId {
        let id = ActorId::next();
        table.insert(ControlBlock::new(id, None, ActorPriority::Normal, 8)).unwrap();
        id
    }

    #[test]
    fn link_is_bidirectional_and_rejects_self_link() {
        let mut table = ActorTable::<M>::new(8);
        let a = spawn(&mut table);
        let b = spawn(&mut table);
        assert!(link(&mut table, a, b).is_ok());
        assert!(table.get(a).unwrap().links.contains(&b));
        assert!(table.get(b).unwrap().links.contains(&a));
        assert!(!link(&mut table, a, a).is_ok());
    }

    #[test]
    fn death_notifies_links_then_monitors() {
        let mut table = ActorTable::<M>::new(8);
        let a = spawn(&mut table);
        let b = spawn(&mut table);
        let watcher = spawn(&mut table);
        link(&mut table, a, b);
        monitor(&mut table, watcher, a).unwrap();

        table.mark_dead(a);
        notify_death(&mut table, a, ExitReason::Crash);

        let notice = table.get_mut(b).unwrap().mailbox.try_pop().unwrap();
        assert_eq!(notice.decode_exit().unwrap().actor, a);
        let notice2 = table.get_mut(watcher).unwrap().mailbox.try_pop().unwrap();
        assert_eq!(notice2.decode_exit().unwrap().reason, ExitReason::Crash);
        assert!(!table.get(b).unwrap().links.contains(&a));
    }

    #[test]
    fn demonitor_after_target_death_reports_invalid() {
        let mut table = ActorTable::<M>::new(8);
        let a = spawn(&mut table);
        let watcher = spawn(&mut table);
        let monref = monitor(&mut table, watcher, a).unwrap();
        table.mark_dead(a);
        notify_death(&mut table, a, ExitReason::Normal);
        table.free(a);
        assert!(!demonitor(&mut table, monref).is_ok());
    }
}
