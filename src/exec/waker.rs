//! The `Wake` implementation the executor polls every actor with.

use std::sync::Arc;
use std::task::Wake;

use tokio::sync::mpsc;

use crate::ids::ActorId;

/// Waking an actor means one thing here: put its id back on the ready
/// queue. There is no thread to unpark, no I/O driver to nudge — just a
/// channel send the executor's idle wait is already listening on.
pub struct ActorWaker {
    id: ActorId,
    tx: mpsc::UnboundedSender<ActorId>,
}

impl ActorWaker {
    pub fn new(id: ActorId, tx: mpsc::UnboundedSender<ActorId>) -> Self {
        ActorWaker { id, tx }
    }
}

impl Wake for ActorWaker {
    fn wake(self: Arc<Self>) {
        let _ = self.tx.send(self.id);
    }

    fn wake_by_ref(self: &Arc<Self>) {
        let _ = self.tx.send(self.id);
    }
}
