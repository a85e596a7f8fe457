//! Broadcast-protocol log records.
//!
//! Each process of a broadcast run writes one event per line:
//! - `b <msgId>` when it originates message `msgId`
//! - `d <senderId> <msgId>` when it delivers message `msgId` from host `senderId`

use std::path::PathBuf;

use crate::process::ProcessIndex;

/// A single broadcast-protocol event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(tag = "type", rename_all = "snake_case"))]
pub enum BroadcastEvent {
    /// The process originated message `msg_id`.
    Broadcast { msg_id: u64 },
    /// The process delivered message `msg_id` originated by 1-based host `sender`.
    Deliver { sender: u64, msg_id: u64 },
}

/// An event together with the 1-based line it was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct LoggedEvent {
    pub line: usize,
    pub event: BroadcastEvent,
}

/// Parsed output of one process in a broadcast run, in log order.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct BroadcastLog {
    pub process: ProcessIndex,
    /// File the events were read from.
    pub source: PathBuf,
    pub events: Vec<LoggedEvent>,
}

impl BroadcastLog {
    #[must_use]
    pub fn new(process: ProcessIndex, source: impl Into<PathBuf>) -> Self {
        Self {
            process,
            source: source.into(),
            events: Vec::new(),
        }
    }

    pub fn push(&mut self, line: usize, event: BroadcastEvent) {
        self.events.push(LoggedEvent { line, event });
    }
}
