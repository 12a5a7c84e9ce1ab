//! Non-blocking file and network operations, exposed as plain async
//! functions rather than dedicated I/O actors. Since every actor body
//! already runs as a plain `async fn` polled cooperatively by
//! [`crate::exec::Executor`], calling `tokio::fs`/`tokio::net` directly
//! from inside `Actor::run` already suspends only that actor — Tokio's
//! blocking pool and reactor stand in for a hand-rolled completion queue
//! and wakeup signal.

pub mod fs;
pub mod net;
