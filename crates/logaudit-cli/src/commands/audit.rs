// Command handlers for: Broadcast, Lattice

use std::path::Path;

use logaudit_conformance::{audit_broadcast, audit_lattice, CheckerOptions, ReportMode};
use miette::IntoDiagnostic;

use super::helpers::{emit_check_result, parse_output_format, parse_round_policy};
use crate::types::Verdict;

fn report_mode(collect_all: bool) -> ReportMode {
    if collect_all {
        ReportMode::CollectAll
    } else {
        ReportMode::FailFast
    }
}

pub(crate) fn run_broadcast_command(
    path: &Path,
    nb_proc: u64,
    nb_msg: u64,
    fifo: bool,
    collect_all: bool,
    format: &str,
) -> miette::Result<Verdict> {
    let format = parse_output_format(format);
    let num_processes = usize::try_from(nb_proc).into_diagnostic()?;
    let options = CheckerOptions {
        report: report_mode(collect_all),
        fifo,
        ..CheckerOptions::default()
    };
    let result = audit_broadcast(path, num_processes, nb_msg, options)?;
    emit_check_result(&result, format)
}

pub(crate) fn run_lattice_command(
    path: &Path,
    round_policy: &str,
    cross_process: bool,
    collect_all: bool,
    format: &str,
) -> miette::Result<Verdict> {
    let format = parse_output_format(format);
    let options = CheckerOptions {
        report: report_mode(collect_all),
        round_policy: parse_round_policy(round_policy),
        cross_process,
        ..CheckerOptions::default()
    };
    let result = audit_lattice(path, options)?;
    emit_check_result(&result, format)
}
