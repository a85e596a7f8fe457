// Argument parsing and result rendering shared by the audit commands.

use std::fmt::Write as _;

use logaudit_conformance::{CheckResult, RoundPolicy, Violation};
use miette::IntoDiagnostic;

use crate::types::{OutputFormat, Verdict, EXIT_INPUT_ERROR};

pub(crate) fn parse_output_format(raw: &str) -> OutputFormat {
    match raw {
        "text" => OutputFormat::Text,
        "json" => OutputFormat::Json,
        other => {
            eprintln!("Unknown output format: {other}. Use 'text' or 'json'.");
            std::process::exit(EXIT_INPUT_ERROR);
        }
    }
}

pub(crate) fn parse_round_policy(raw: &str) -> RoundPolicy {
    match raw.trim().to_ascii_lowercase().as_str() {
        "truncate" => RoundPolicy::Truncate,
        "strict" => RoundPolicy::Strict,
        other => {
            eprintln!("Unknown round policy: {other}. Use 'truncate' or 'strict'.");
            std::process::exit(EXIT_INPUT_ERROR);
        }
    }
}

pub(crate) fn render_violation(v: &Violation) -> String {
    let location = match v.position {
        Some(pos) => format!("{}:{pos}", v.file.display()),
        None => v.file.display().to_string(),
    };
    format!("{} ({location}): {:?}: {}", v.process, v.kind, v.message)
}

pub(crate) fn render_check_text(result: &CheckResult) -> String {
    if result.passed {
        return "PASSED\n".into();
    }
    let mut out = format!("FAILED: {} violation(s)\n", result.violations.len());
    for v in &result.violations {
        let _ = writeln!(out, "  {}", render_violation(v));
    }
    out
}

/// Print a check result on stdout and turn it into a verdict.
pub(crate) fn emit_check_result(
    result: &CheckResult,
    format: OutputFormat,
) -> miette::Result<Verdict> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(result).into_diagnostic()?;
            println!("{json}");
        }
        OutputFormat::Text => print!("{}", render_check_text(result)),
    }
    Ok(Verdict::from_passed(result.passed))
}
