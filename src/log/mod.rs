//! Structured runtime logging, plus a bare-metal-friendly binary wire
//! format for targets without a line-oriented log sink.
//!
//! A small sink trait with console, no-op, and file-backed
//! implementations carries the runtime's own lifecycle notices (spawn,
//! crash, deadlock) rather than application metrics.

pub mod binary;

use std::cell::RefCell;
use std::fmt;
use std::fs::File;
use std::io::Write;

use serde::Serialize;

use crate::ids::ActorId;
use crate::message::ExitReason;

/// One runtime lifecycle event, emitted to whatever `LogSink` the
/// `Runtime` was configured with.
#[derive(Debug, Clone, Serialize)]
pub enum Event {
    ActorSpawned { id: ActorId, name: Option<String> },
    ActorExited { id: ActorId, reason: ExitReason },
    Deadlock { pending_actors: usize },
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::ActorSpawned { id, name } => match name {
                Some(n) => write!(f, "spawned {id} ({n})"),
                None => write!(f, "spawned {id}"),
            },
            Event::ActorExited { id, reason } => write!(f, "{id} exited: {reason:?}"),
            Event::Deadlock { pending_actors } => {
                write!(f, "deadlock: {pending_actors} actor(s) still pending")
            }
        }
    }
}

/// Where runtime events go: swap sinks to redirect without touching the
/// call sites that emit events.
pub trait LogSink {
    fn record(&self, event: &Event);
}

/// Prints each event to stderr with a UTC timestamp — the default sink,
/// easy to read during development rather than optimized for throughput.
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn record(&self, event: &Event) {
        eprintln!("[{}] {event}", chrono::Utc::now().to_rfc3339());
    }
}

/// Discards everything.
pub struct NullSink;

impl LogSink for NullSink {
    fn record(&self, _event: &Event) {}
}

/// Appends one JSON object per line, for targets with a log aggregator
/// that expects structured input rather than the binary wire format in
/// [`binary`].
pub struct JsonFileSink {
    file: RefCell<File>,
}

impl JsonFileSink {
    pub fn create(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        Ok(JsonFileSink {
            file: RefCell::new(File::create(path)?),
        })
    }
}

impl LogSink for JsonFileSink {
    fn record(&self, event: &Event) {
        if let Ok(mut line) = serde_json::to_string(event) {
            line.push('\n');
            let _ = self.file.borrow_mut().write_all(line.as_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Collector(RefCell<Vec<String>>);

    impl LogSink for Collector {
        fn record(&self, event: &Event) {
            self.0.borrow_mut().push(event.to_string());
        }
    }

    #[test]
    fn collector_sink_records_formatted_events() {
        let sink = Collector(RefCell::new(Vec::new()));
        sink.record(&Event::ActorSpawned {
            id: ActorId::FIRST_DYNAMIC,
            name: Some("worker".into()),
        });
        assert_eq!(sink.0.borrow()[0], "spawned actor#3 (worker)");
    }

    #[test]
    fn null_sink_drops_everything() {
        let sink = NullSink;
        sink.record(&Event::Deadlock { pending_actors: 2 });
    }

    #[test]
    fn json_sink_writes_one_valid_object_per_line() {
        let path = std::env::temp_dir().join(format!("moterun-log-test-{}.jsonl", std::process::id()));
        let sink = JsonFileSink::create(&path).unwrap();
        sink.record(&Event::Deadlock { pending_actors: 1 });
        let contents = std::fs::read_to_string(&path).unwrap();
        let line = contents.lines().next().unwrap();
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(value.get("Deadlock").is_some());
        let _ = std::fs::remove_file(&path);
    }
}
