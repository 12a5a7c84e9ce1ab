//! Convenience re-export surface: `use moterun::prelude::*;` pulls in the
//! types most applications touch, without reaching into individual
//! submodules.

pub use crate::actor::{Actor, ActorContext, ErrorAction};
pub use crate::bus::BusConfig;
pub use crate::ids::{ActorId, BusId, MonitorRef, TimerId};
pub use crate::message::{Envelope, ExitReason, Message, SendMode};
pub use crate::priority::ActorPriority;
pub use crate::runtime::{Config, DeadlockPolicy, Runtime};
pub use crate::status::{Status, StatusCode};
