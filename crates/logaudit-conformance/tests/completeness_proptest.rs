//! Property tests for the broadcast completeness check.

use std::path::Path;

use logaudit_conformance::parse::parse_broadcast_log;
use logaudit_conformance::{BroadcastChecker, ViolationKind};
use logaudit_trace::ProcessIndex;
use proptest::prelude::*;

/// Every line of a complete log for a single-process run with `m` messages.
fn complete_lines(m: u64) -> Vec<String> {
    (1..=m)
        .map(|id| format!("b {id}"))
        .chain((1..=m).map(|id| format!("d 1 {id}")))
        .collect()
}

fn check(lines: &[String], m: u64) -> logaudit_conformance::CheckResult {
    let raw = lines.join("\n");
    let log = parse_broadcast_log(ProcessIndex(0), Path::new("1.output"), &raw).expect("parse");
    BroadcastChecker::new(1, m).check(&[log])
}

proptest! {
    #[test]
    fn any_order_of_a_complete_log_passes(
        (m, lines) in (0u64..12).prop_flat_map(|m| {
            (Just(m), Just(complete_lines(m)).prop_shuffle())
        })
    ) {
        let result = check(&lines, m);
        prop_assert!(result.passed, "violations: {:?}", result.violations);
    }

    #[test]
    fn dropping_any_line_fails(
        (m, drop) in (1u64..12).prop_flat_map(|m| (Just(m), 0..(2 * m as usize)))
    ) {
        let mut lines = complete_lines(m);
        lines.remove(drop);
        let result = check(&lines, m);
        prop_assert!(!result.passed);
        prop_assert_eq!(result.violations[0].kind, ViolationKind::MissingDelivery);
    }

    #[test]
    fn duplicating_any_line_fails(
        (m, dup) in (1u64..12).prop_flat_map(|m| (Just(m), 0..(2 * m as usize)))
    ) {
        let mut lines = complete_lines(m);
        let copy = lines[dup].clone();
        lines.push(copy);
        let result = check(&lines, m);
        prop_assert!(!result.passed);
        prop_assert_eq!(result.violations[0].kind, ViolationKind::DuplicateDelivery);
    }
}
