//! Invariant models built from parsed logs.
//!
//! For a broadcast run the model of one process is its [`DeliveryRecord`]:
//! the raw message ids logged per bucket, with multiplicities intact so the
//! checker can name duplicates precisely. The expected content of every
//! bucket is [`ExpectedSequence::canonical`].

use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;

use logaudit_trace::{BroadcastEvent, BroadcastLog, ProcessIndex};
use serde::{Deserialize, Serialize};

/// Key of a delivery bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    /// Messages the process broadcast itself (`b` lines).
    Broadcast,
    /// Messages delivered from the 1-based host id (`d <id>` lines).
    Sender(u64),
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bucket::Broadcast => f.write_str("b"),
            Bucket::Sender(id) => write!(f, "d {id}"),
        }
    }
}

/// A delivery attributed to a sender id outside `1..=num_processes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrayDelivery {
    pub line: usize,
    pub sender: u64,
    pub msg_id: u64,
}

/// Per-process record of every message id logged, by bucket.
#[derive(Debug, Clone)]
pub struct DeliveryRecord {
    pub process: ProcessIndex,
    buckets: BTreeMap<Bucket, Vec<u64>>,
    stray: Vec<StrayDelivery>,
}

impl DeliveryRecord {
    /// Empty record with the broadcast bucket and one bucket per sender `1..=num_processes`.
    pub fn new(process: ProcessIndex, num_processes: usize) -> Self {
        let mut buckets = BTreeMap::new();
        buckets.insert(Bucket::Broadcast, Vec::new());
        for peer in 0..num_processes {
            buckets.insert(Bucket::Sender(ProcessIndex(peer).host_id()), Vec::new());
        }
        Self {
            process,
            buckets,
            stray: Vec::new(),
        }
    }

    /// Build the record of a whole log.
    pub fn from_log(log: &BroadcastLog, num_processes: usize) -> Self {
        let mut record = Self::new(log.process, num_processes);
        for logged in &log.events {
            record.record(logged.line, logged.event);
        }
        record
    }

    /// Append one event. No sorting or deduplication happens here.
    pub fn record(&mut self, line: usize, event: BroadcastEvent) {
        let (bucket, msg_id) = match event {
            BroadcastEvent::Broadcast { msg_id } => (Bucket::Broadcast, msg_id),
            BroadcastEvent::Deliver { sender, msg_id } => (Bucket::Sender(sender), msg_id),
        };
        match self.buckets.get_mut(&bucket) {
            Some(ids) => ids.push(msg_id),
            None => {
                if let BroadcastEvent::Deliver { sender, msg_id } = event {
                    self.stray.push(StrayDelivery {
                        line,
                        sender,
                        msg_id,
                    });
                }
            }
        }
    }

    /// Buckets in check order: own broadcasts first, then senders ascending.
    pub fn buckets(&self) -> impl Iterator<Item = (Bucket, &[u64])> {
        self.buckets.iter().map(|(b, ids)| (*b, ids.as_slice()))
    }

    pub fn bucket(&self, bucket: Bucket) -> Option<&[u64]> {
        self.buckets.get(&bucket).map(Vec::as_slice)
    }

    /// Deliveries whose sender id has no bucket.
    pub fn stray(&self) -> &[StrayDelivery] {
        &self.stray
    }
}

/// The canonical bucket content `1..=num_messages`, never materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedSequence {
    num_messages: u64,
}

impl ExpectedSequence {
    pub fn canonical(num_messages: u64) -> Self {
        Self { num_messages }
    }

    pub fn contains(&self, id: u64) -> bool {
        (1..=self.num_messages).contains(&id)
    }

    /// True when an ascending bucket equals `1..=num_messages` exactly.
    pub fn matches(&self, sorted: &[u64]) -> bool {
        sorted.len() as u64 == self.num_messages
            && sorted.iter().zip(1u64..).all(|(a, b)| *a == b)
    }

    /// Ranges of `1..=num_messages` absent from an ascending bucket.
    pub fn gaps(&self, sorted: &[u64]) -> Vec<RangeInclusive<u64>> {
        let mut gaps = Vec::new();
        // Next id not yet covered; `None` once u64::MAX is covered.
        let mut next = Some(1u64);
        for &id in sorted.iter().filter(|id| self.contains(**id)) {
            let Some(want) = next else { break };
            if id > want {
                gaps.push(want..=id - 1);
            }
            if id >= want {
                next = id.checked_add(1);
            }
        }
        if let Some(want) = next {
            if want <= self.num_messages {
                gaps.push(want..=self.num_messages);
            }
        }
        gaps
    }
}

/// Difference between a bucket and the canonical sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketDiff {
    /// Ids in range logged more than once (each listed once).
    pub duplicated: Vec<u64>,
    /// Ranges of ids in range never logged.
    pub missing: Vec<RangeInclusive<u64>>,
    /// Ids outside `1..=num_messages` (each listed once).
    pub unexpected: Vec<u64>,
}

impl BucketDiff {
    /// Compare a bucket with `1..=num_messages`. Work is bounded by the bucket
    /// size, not by `num_messages`.
    pub fn compute(ids: &[u64], num_messages: u64) -> Self {
        let expected = ExpectedSequence::canonical(num_messages);
        let mut sorted = ids.to_vec();
        sorted.sort_unstable();
        if expected.matches(&sorted) {
            return Self::default();
        }

        let mut counts: BTreeMap<u64, usize> = BTreeMap::new();
        for id in &sorted {
            *counts.entry(*id).or_insert(0) += 1;
        }
        Self {
            duplicated: counts
                .iter()
                .filter(|(id, n)| expected.contains(**id) && **n > 1)
                .map(|(id, _)| *id)
                .collect(),
            missing: expected.gaps(&sorted),
            unexpected: counts
                .keys()
                .copied()
                .filter(|id| !expected.contains(*id))
                .collect(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.duplicated.is_empty() && self.missing.is_empty() && self.unexpected.is_empty()
    }
}
