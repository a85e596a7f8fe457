use std::collections::{BTreeSet, HashMap};
use std::ops::RangeInclusive;
use std::path::PathBuf;

use logaudit_trace::{BroadcastEvent, BroadcastLog, LatticeLog, ProcessIndex, ValueSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::{BucketDiff, DeliveryRecord};

/// Result of checking one run directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    /// Whether the run passes all checks.
    pub passed: bool,
    /// Violations found, in detection order (empty if passed).
    pub violations: Vec<Violation>,
}

impl CheckResult {
    fn from_violations(violations: Vec<Violation>) -> Self {
        Self {
            passed: violations.is_empty(),
            violations,
        }
    }

    /// The representative failure: the first violation detected.
    pub fn primary(&self) -> Option<&Violation> {
        self.violations.first()
    }
}

/// A single safety violation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    /// Process whose log exhibits the violation.
    pub process: ProcessIndex,
    /// Log file of that process.
    pub file: PathBuf,
    /// 1-based line or round the violation points at, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    /// Kind of violation.
    pub kind: ViolationKind,
    /// Human-readable description.
    pub message: String,
}

/// The kind of safety violation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ViolationKind {
    /// More logs than configured processes.
    ProcessCountMismatch,
    /// A message id was logged more than once in a bucket.
    DuplicateDelivery,
    /// A message id in `1..=M` never appears in a bucket.
    MissingDelivery,
    /// A message id outside `1..=M` appears in a bucket.
    UnexpectedMessage,
    /// A delivery names a sender outside `1..=N`.
    UnknownSender,
    /// Broadcasts or per-sender deliveries are not in increasing id order.
    FifoOrderViolation,
    /// A proposed value is absent from the decided set of the same round.
    ProposalNotDecided,
    /// Number of checked rounds differs from `requiredAgreementRounds`.
    AgreementCountMismatch,
    /// Output and config hold a different number of rounds.
    RoundCountMismatch,
    /// Two processes decided incomparable sets in the same round.
    IncomparableDecisions,
    /// A decided value was proposed by no process in that round.
    UnproposedValue,
}

/// Whether checking stops at the first violation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ReportMode {
    #[default]
    FailFast,
    CollectAll,
}

/// How output rounds are paired with config rounds in a lattice run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoundPolicy {
    /// Pair up to the shorter side; surplus lines on either side are ignored.
    #[default]
    Truncate,
    /// Output and config must hold the same number of rounds.
    Strict,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CheckerOptions {
    pub report: ReportMode,
    pub round_policy: RoundPolicy,
    /// Broadcast only: require increasing ids per bucket, in log order.
    pub fifo: bool,
    /// Lattice only: require comparable decisions across processes, each
    /// contained in the union of the round's proposals.
    pub cross_process: bool,
}

impl CheckerOptions {
    pub fn collect_all(mut self) -> Self {
        self.report = ReportMode::CollectAll;
        self
    }
}

/// Accumulates violations and tells callers when to stop.
struct Sink {
    mode: ReportMode,
    violations: Vec<Violation>,
}

impl Sink {
    fn new(mode: ReportMode) -> Self {
        Self {
            mode,
            violations: Vec::new(),
        }
    }

    fn push(&mut self, violation: Violation) {
        debug!(process = %violation.process, kind = ?violation.kind, "{}", violation.message);
        self.violations.push(violation);
    }

    fn done(&self) -> bool {
        self.mode == ReportMode::FailFast && !self.violations.is_empty()
    }

    fn finish(mut self) -> CheckResult {
        if self.mode == ReportMode::FailFast {
            self.violations.truncate(1);
        }
        CheckResult::from_violations(self.violations)
    }
}

fn list(ids: &[u64]) -> String {
    ids.iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn list_ranges(ranges: &[RangeInclusive<u64>]) -> String {
    ranges
        .iter()
        .map(|r| {
            if r.start() == r.end() {
                r.start().to_string()
            } else {
                format!("{}..={}", r.start(), r.end())
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn list_values(values: &ValueSet) -> String {
    values
        .iter()
        .map(|v| v.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Validates a broadcast run: every bucket of every process must hold
/// exactly the ids `1..=num_messages`.
pub struct BroadcastChecker {
    num_processes: usize,
    num_messages: u64,
    options: CheckerOptions,
}

impl BroadcastChecker {
    pub fn new(num_processes: usize, num_messages: u64) -> Self {
        Self::new_with_options(num_processes, num_messages, CheckerOptions::default())
    }

    pub fn new_with_options(
        num_processes: usize,
        num_messages: u64,
        options: CheckerOptions,
    ) -> Self {
        Self {
            num_processes,
            num_messages,
            options,
        }
    }

    /// Check the logs of a run, in process-index order.
    pub fn check(&self, logs: &[BroadcastLog]) -> CheckResult {
        let mut sink = Sink::new(self.options.report);

        if logs.len() > self.num_processes {
            let extra = &logs[self.num_processes];
            sink.push(Violation {
                process: extra.process,
                file: extra.source.clone(),
                position: None,
                kind: ViolationKind::ProcessCountMismatch,
                message: format!(
                    "found {} output files but the run has {} processes",
                    logs.len(),
                    self.num_processes
                ),
            });
            return sink.finish();
        }
        if logs.len() < self.num_processes {
            warn!(
                found = logs.len(),
                expected = self.num_processes,
                "fewer output files than processes; only discovered files are checked"
            );
        }

        for log in logs {
            self.check_process(log, &mut sink);
            if sink.done() {
                break;
            }
        }
        sink.finish()
    }

    fn check_process(&self, log: &BroadcastLog, sink: &mut Sink) {
        let record = DeliveryRecord::from_log(log, self.num_processes);
        let violation = |position: Option<usize>, kind: ViolationKind, message: String| Violation {
            process: log.process,
            file: log.source.clone(),
            position,
            kind,
            message,
        };

        for (bucket, ids) in record.buckets() {
            debug!(process = %log.process, %bucket, count = ids.len(), "checking bucket");
            let diff = BucketDiff::compute(ids, self.num_messages);
            if !diff.duplicated.is_empty() {
                sink.push(violation(
                    None,
                    ViolationKind::DuplicateDelivery,
                    format!("bucket '{bucket}' holds duplicate ids [{}]", list(&diff.duplicated)),
                ));
            }
            if !diff.missing.is_empty() {
                sink.push(violation(
                    None,
                    ViolationKind::MissingDelivery,
                    format!(
                        "bucket '{bucket}' is missing ids [{}]",
                        list_ranges(&diff.missing)
                    ),
                ));
            }
            if !diff.unexpected.is_empty() {
                sink.push(violation(
                    None,
                    ViolationKind::UnexpectedMessage,
                    format!(
                        "bucket '{bucket}' holds ids [{}] outside 1..={}",
                        list(&diff.unexpected),
                        self.num_messages
                    ),
                ));
            }
            if sink.done() {
                return;
            }
        }

        for stray in record.stray() {
            sink.push(violation(
                Some(stray.line),
                ViolationKind::UnknownSender,
                format!(
                    "delivery of message {} from sender {} outside 1..={}",
                    stray.msg_id, stray.sender, self.num_processes
                ),
            ));
            if sink.done() {
                return;
            }
        }

        if self.options.fifo {
            self.check_fifo(log, sink, &violation);
        }
    }

    fn check_fifo(
        &self,
        log: &BroadcastLog,
        sink: &mut Sink,
        violation: &dyn Fn(Option<usize>, ViolationKind, String) -> Violation,
    ) {
        // Last id seen per bucket: index 0 for own broadcasts, else the sender id.
        let mut last: HashMap<u64, u64> = HashMap::new();
        for logged in &log.events {
            let (key, label, msg_id) = match logged.event {
                BroadcastEvent::Broadcast { msg_id } => (0, "b".to_string(), msg_id),
                BroadcastEvent::Deliver { sender, msg_id } => {
                    (sender, format!("d {sender}"), msg_id)
                }
            };
            if let Some(prev) = last.insert(key, msg_id) {
                if msg_id <= prev {
                    sink.push(violation(
                        Some(logged.line),
                        ViolationKind::FifoOrderViolation,
                        format!("bucket '{label}' logs message {msg_id} after message {prev}"),
                    ));
                    if sink.done() {
                        return;
                    }
                }
            }
        }
    }
}

/// Validates a lattice agreement run: every proposal is contained in the
/// decision of the same round, and the number of checked rounds matches
/// `requiredAgreementRounds`.
pub struct LatticeChecker {
    options: CheckerOptions,
}

impl LatticeChecker {
    pub fn new() -> Self {
        Self::new_with_options(CheckerOptions::default())
    }

    pub fn new_with_options(options: CheckerOptions) -> Self {
        Self { options }
    }

    pub fn check(&self, logs: &[LatticeLog]) -> CheckResult {
        let mut sink = Sink::new(self.options.report);
        for log in logs {
            self.check_process(log, &mut sink);
            if sink.done() {
                return sink.finish();
            }
        }
        if self.options.cross_process {
            self.check_cross_process(logs, &mut sink);
        }
        sink.finish()
    }

    fn check_process(&self, log: &LatticeLog, sink: &mut Sink) {
        let violation = |position: Option<usize>, kind: ViolationKind, message: String| Violation {
            process: log.process,
            file: log.output_source.clone(),
            position,
            kind,
            message,
        };

        let mut checked = 0usize;
        for (round, proposed, decided) in log.rounds() {
            debug!(process = %log.process, round, "checking round");
            let dropped: ValueSet = proposed.difference(decided).cloned().collect();
            if !dropped.is_empty() {
                sink.push(violation(
                    Some(round),
                    ViolationKind::ProposalNotDecided,
                    format!(
                        "round {round}: proposed values [{}] missing from decided set [{}]",
                        list_values(&dropped),
                        list_values(decided)
                    ),
                ));
                if sink.done() {
                    return;
                }
            }
            checked += 1;
        }

        let configured = log.config.proposals.len();
        let decided = log.decisions.len();
        if self.options.round_policy == RoundPolicy::Strict && configured != decided {
            sink.push(violation(
                None,
                ViolationKind::RoundCountMismatch,
                format!("output has {decided} round(s) but config has {configured}"),
            ));
            if sink.done() {
                return;
            }
        }

        let required = log.config.required_agreement_rounds;
        if checked != required {
            sink.push(violation(
                None,
                ViolationKind::AgreementCountMismatch,
                format!("{checked} round(s) checked but {required} agreement round(s) required"),
            ));
        }
    }

    fn check_cross_process(&self, logs: &[LatticeLog], sink: &mut Sink) {
        let rounds = logs.iter().map(|l| l.decisions.len()).max().unwrap_or(0);
        for index in 0..rounds {
            let round = index + 1;
            let proposed: BTreeSet<_> = logs
                .iter()
                .filter_map(|l| l.config.proposals.get(index))
                .flatten()
                .collect();

            let deciders: Vec<(&LatticeLog, &ValueSet)> = logs
                .iter()
                .filter_map(|l| l.decisions.get(index).map(|d| (l, d)))
                .collect();

            for (log, decided) in &deciders {
                let unproposed: ValueSet = decided
                    .iter()
                    .filter(|v| !proposed.contains(v))
                    .cloned()
                    .collect();
                if !unproposed.is_empty() {
                    sink.push(Violation {
                        process: log.process,
                        file: log.output_source.clone(),
                        position: Some(round),
                        kind: ViolationKind::UnproposedValue,
                        message: format!(
                            "round {round}: decided values [{}] were proposed by no process",
                            list_values(&unproposed)
                        ),
                    });
                    if sink.done() {
                        return;
                    }
                }
            }

            for (i, (a, a_set)) in deciders.iter().enumerate() {
                for (b, b_set) in &deciders[i + 1..] {
                    if !a_set.is_subset(b_set) && !b_set.is_subset(a_set) {
                        sink.push(Violation {
                            process: b.process,
                            file: b.output_source.clone(),
                            position: Some(round),
                            kind: ViolationKind::IncomparableDecisions,
                            message: format!(
                                "round {round}: decision [{}] of {} and [{}] of {} are incomparable",
                                list_values(a_set),
                                a.process,
                                list_values(b_set),
                                b.process
                            ),
                        });
                        if sink.done() {
                            return;
                        }
                    }
                }
            }
        }
    }
}

impl Default for LatticeChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logaudit_trace::lattice::value_set;
    use logaudit_trace::LatticeConfig;

    fn broadcast_log(process: usize, lines: &[&str]) -> BroadcastLog {
        let raw = lines.join("\n");
        crate::parse::parse_broadcast_log(
            ProcessIndex(process),
            std::path::Path::new(&format!("{}.output", process + 1)),
            &raw,
        )
        .expect("parse fixture")
    }

    fn lattice_log(
        process: usize,
        required: usize,
        config: &[&str],
        output: &[&str],
    ) -> LatticeLog {
        LatticeLog {
            process: ProcessIndex(process),
            output_source: format!("{}.output", process + 1).into(),
            config_source: format!("{}.config", process + 1).into(),
            config: LatticeConfig {
                required_agreement_rounds: required,
                max_rounds: 5,
                proposals: config.iter().map(|l| value_set(l)).collect(),
            },
            decisions: output.iter().map(|l| value_set(l)).collect(),
        }
    }

    fn kinds(result: &CheckResult) -> Vec<ViolationKind> {
        result.violations.iter().map(|v| v.kind).collect()
    }

    fn complete_run() -> Vec<BroadcastLog> {
        (0..2)
            .map(|p| broadcast_log(p, &["b 1", "d 1 1", "d 2 1"]))
            .collect()
    }

    #[test]
    fn complete_run_passes() {
        let result = BroadcastChecker::new(2, 1).check(&complete_run());
        assert!(result.passed, "violations: {:?}", result.violations);
        assert!(result.primary().is_none());
    }

    #[test]
    fn fail_fast_reports_a_single_violation() {
        let logs = vec![broadcast_log(0, &["d 1 1", "d 1 1"]), broadcast_log(1, &[])];
        let result = BroadcastChecker::new(2, 1).check(&logs);
        assert!(!result.passed);
        assert_eq!(result.violations.len(), 1);
        // Own-broadcast bucket is checked first.
        assert_eq!(result.violations[0].kind, ViolationKind::MissingDelivery);
        assert!(result.violations[0].message.contains("bucket 'b'"));
    }

    #[test]
    fn collect_all_reports_every_bucket() {
        let logs = vec![broadcast_log(0, &["b 1", "d 1 1", "d 1 1", "d 2 5"])];
        let checker =
            BroadcastChecker::new_with_options(2, 1, CheckerOptions::default().collect_all());
        let result = checker.check(&logs);
        assert_eq!(
            kinds(&result),
            vec![
                ViolationKind::DuplicateDelivery,
                ViolationKind::MissingDelivery,
                ViolationKind::UnexpectedMessage,
            ]
        );
        assert_eq!(result.primary().map(|v| v.kind), Some(ViolationKind::DuplicateDelivery));
    }

    #[test]
    fn too_many_logs_is_a_process_count_mismatch() {
        let result = BroadcastChecker::new(1, 1).check(&complete_run());
        assert_eq!(kinds(&result), vec![ViolationKind::ProcessCountMismatch]);
        assert_eq!(result.violations[0].process, ProcessIndex(1));
    }

    #[test]
    fn sender_outside_run_is_reported() {
        let logs = vec![broadcast_log(0, &["b 1", "d 1 1", "d 3 1"])];
        let result = BroadcastChecker::new(1, 1).check(&logs);
        assert_eq!(kinds(&result), vec![ViolationKind::UnknownSender]);
        assert_eq!(result.violations[0].position, Some(3));
    }

    #[test]
    fn zero_messages_requires_empty_buckets() {
        assert!(BroadcastChecker::new(1, 0).check(&[broadcast_log(0, &[])]).passed);
        let result = BroadcastChecker::new(1, 0).check(&[broadcast_log(0, &["b 1"])]);
        assert_eq!(kinds(&result), vec![ViolationKind::UnexpectedMessage]);
    }

    #[test]
    fn huge_message_count_reports_missing_range_instead_of_panicking() {
        let result = BroadcastChecker::new(1, u64::MAX).check(&[broadcast_log(0, &["b 1"])]);
        assert_eq!(kinds(&result), vec![ViolationKind::MissingDelivery]);
        assert!(
            result.violations[0]
                .message
                .contains(&format!("[2..={}]", u64::MAX)),
            "message: {}",
            result.violations[0].message
        );
    }

    #[test]
    fn fifo_order_is_opt_in() {
        let logs = vec![broadcast_log(0, &["b 1", "b 2", "d 1 2", "d 1 1"])];
        assert!(BroadcastChecker::new(1, 2).check(&logs).passed);

        let options = CheckerOptions {
            fifo: true,
            ..CheckerOptions::default()
        };
        let result = BroadcastChecker::new_with_options(1, 2, options).check(&logs);
        assert_eq!(kinds(&result), vec![ViolationKind::FifoOrderViolation]);
        assert_eq!(result.violations[0].position, Some(4));
    }

    #[test]
    fn lattice_subset_rounds_pass() {
        let logs = vec![lattice_log(0, 2, &["a b", "b c"], &["a b c", "b c d"])];
        let result = LatticeChecker::new().check(&logs);
        assert!(result.passed, "violations: {:?}", result.violations);
    }

    #[test]
    fn lattice_dropped_proposal_fails_at_its_round() {
        let logs = vec![lattice_log(0, 2, &["a b", "b c"], &["a b c", "b"])];
        let result = LatticeChecker::new().check(&logs);
        assert_eq!(kinds(&result), vec![ViolationKind::ProposalNotDecided]);
        assert_eq!(result.violations[0].position, Some(2));
        assert!(result.violations[0].message.contains("[c]"));
    }

    #[test]
    fn lattice_short_output_is_a_count_mismatch() {
        let logs = vec![lattice_log(0, 3, &["a", "b", "c"], &["a", "b"])];
        let result = LatticeChecker::new().check(&logs);
        assert_eq!(kinds(&result), vec![ViolationKind::AgreementCountMismatch]);
        assert!(result.violations[0].message.contains("2 round(s) checked but 3"));
    }

    #[test]
    fn lattice_zero_rounds_is_valid() {
        let logs = vec![lattice_log(0, 0, &[], &[])];
        assert!(LatticeChecker::new().check(&logs).passed);
    }

    #[test]
    fn extra_output_lines_only_fail_under_strict_policy() {
        let logs = vec![lattice_log(0, 1, &["a"], &["a", "z"])];
        assert!(LatticeChecker::new().check(&logs).passed);

        let strict = CheckerOptions {
            round_policy: RoundPolicy::Strict,
            ..CheckerOptions::default()
        };
        let result = LatticeChecker::new_with_options(strict).check(&logs);
        assert_eq!(kinds(&result), vec![ViolationKind::RoundCountMismatch]);
    }

    #[test]
    fn cross_process_detects_incomparable_and_unproposed_decisions() {
        let logs = vec![
            lattice_log(0, 1, &["a"], &["a b"]),
            lattice_log(1, 1, &["b"], &["b c"]),
        ];
        assert!(LatticeChecker::new().check(&logs).passed);

        let options = CheckerOptions {
            cross_process: true,
            report: ReportMode::CollectAll,
            ..CheckerOptions::default()
        };
        let result = LatticeChecker::new_with_options(options).check(&logs);
        assert_eq!(
            kinds(&result),
            vec![
                ViolationKind::UnproposedValue,
                ViolationKind::IncomparableDecisions
            ]
        );
        assert_eq!(result.violations[0].process, ProcessIndex(1));
    }
}
