//! Runtime-wide status/result type.
//!
//! Every public operation in this crate returns [`Status`] (or
//! `Result<T, Status>`) instead of panicking. `message` is always a
//! `'static` string literal so propagating a `Status` never allocates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The taxonomy of outcomes every subsystem can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusCode {
    /// The operation completed successfully.
    Ok,
    /// A fixed-capacity pool (mailbox payloads, timers, links, monitors,
    /// bus slots, actor table) was exhausted.
    NoMem,
    /// Bad argument, wrong calling context, duplicate link, or similar.
    Invalid,
    /// A timed receive or bus read expired before data arrived.
    Timeout,
    /// An I/O endpoint was closed cleanly (not an error).
    Closed,
    /// A non-blocking call found nothing to return.
    WouldBlock,
    /// A syscall failed; see `message` for the OS-reported reason.
    Io,
}

/// A status/result pair returned from runtime operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub code: StatusCode,
    pub message: Option<&'static str>,
}

impl Status {
    pub const OK: Status = Status {
        code: StatusCode::Ok,
        message: None,
    };

    pub const fn new(code: StatusCode, message: &'static str) -> Self {
        Status {
            code,
            message: Some(message),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == StatusCode::Ok
    }

    pub fn nomem(message: &'static str) -> Self {
        Status::new(StatusCode::NoMem, message)
    }

    pub fn invalid(message: &'static str) -> Self {
        Status::new(StatusCode::Invalid, message)
    }

    pub fn timeout(message: &'static str) -> Self {
        Status::new(StatusCode::Timeout, message)
    }

    pub fn closed(message: &'static str) -> Self {
        Status::new(StatusCode::Closed, message)
    }

    pub fn would_block(message: &'static str) -> Self {
        Status::new(StatusCode::WouldBlock, message)
    }

    pub fn io(message: &'static str) -> Self {
        Status::new(StatusCode::Io, message)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message {
            Some(m) => write!(f, "{:?}: {m}", self.code),
            None => write!(f, "{:?}", self.code),
        }
    }
}

impl std::error::Error for Status {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_has_no_message() {
        assert!(Status::OK.is_ok());
        assert_eq!(Status::OK.message, None);
    }

    #[test]
    fn constructors_set_expected_code() {
        assert_eq!(Status::nomem("pool full").code, StatusCode::NoMem);
        assert_eq!(Status::invalid("bad arg").code, StatusCode::Invalid);
        assert_eq!(Status::timeout("expired").code, StatusCode::Timeout);
        assert_eq!(Status::closed("eof").code, StatusCode::Closed);
        assert_eq!(Status::would_block("empty").code, StatusCode::WouldBlock);
        assert_eq!(Status::io("ENOENT").code, StatusCode::Io);
    }

    #[test]
    fn display_includes_message() {
        let s = Status::invalid("duplicate link");
        assert!(format!("{s}").contains("duplicate link"));
    }
}
