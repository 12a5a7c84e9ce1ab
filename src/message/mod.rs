//! Message types and the mailbox envelope.
//!
//! - [`Message`] — trait every actor's payload type implements.
//! - [`MessageClass`] — normal / timer / system mailbox entry kind.
//! - [`ExitReason`] — why an actor terminated.
//! - [`Envelope`] / [`Body`] / [`Payload`] — what actually sits in a
//!   mailbox slot.

pub mod class;
pub mod envelope;
pub mod traits;

pub use class::{ExitReason, MessageClass};
pub use envelope::{Body, Envelope, Payload, Releaser, SendMode};
pub use traits::Message;
