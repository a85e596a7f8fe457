// Command handler for: Suite
//
// Audits every run of a manifest and compares the actual verdict with the
// expected one. A suite passes when every entry matches.

use std::fs;
use std::path::Path;
use std::time::Instant;

use logaudit_conformance::audit_entry;
use logaudit_conformance::manifest::{
    validate_manifest, validate_manifest_paths, AuditManifest, AUDIT_MANIFEST_SCHEMA_VERSION,
};
use miette::IntoDiagnostic;
use serde::Serialize;
use tracing::info;

use super::helpers::{parse_output_format, render_violation};
use crate::types::{OutputFormat, Verdict};

#[derive(Debug, Serialize)]
pub(crate) struct SuiteEntryReport {
    pub(crate) name: String,
    pub(crate) protocol: String,
    pub(crate) path: String,
    pub(crate) expected_verdict: String,
    pub(crate) actual_verdict: String,
    /// `match`, `mismatch` or `error`.
    pub(crate) status: String,
    pub(crate) duration_ms: u64,
    pub(crate) violations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) error: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SuiteReport {
    pub(crate) schema_version: u32,
    pub(crate) suite_name: String,
    pub(crate) manifest_path: String,
    pub(crate) entries: Vec<SuiteEntryReport>,
    pub(crate) passed: usize,
    pub(crate) failed: usize,
    pub(crate) errors: usize,
    pub(crate) overall: String,
}

pub(crate) fn load_manifest(manifest_path: &Path) -> miette::Result<AuditManifest> {
    let raw = fs::read_to_string(manifest_path).into_diagnostic()?;
    let manifest: AuditManifest = serde_json::from_str(&raw).into_diagnostic()?;

    let base_dir = manifest_path.parent().unwrap_or_else(|| Path::new("."));
    let mut errors = validate_manifest(&manifest);
    errors.extend(validate_manifest_paths(&manifest, base_dir));
    if !errors.is_empty() {
        let listed = errors
            .iter()
            .map(|e| format!("  - {e}"))
            .collect::<Vec<_>>()
            .join("\n");
        miette::bail!(
            "Invalid audit manifest '{}':\n{listed}",
            manifest_path.display()
        );
    }
    Ok(manifest)
}

pub(crate) fn run_suite(manifest_path: &Path) -> miette::Result<SuiteReport> {
    let manifest = load_manifest(manifest_path)?;
    let base_dir = manifest_path.parent().unwrap_or_else(|| Path::new("."));

    let mut entries = Vec::with_capacity(manifest.entries.len());
    let (mut passed, mut failed, mut errors) = (0usize, 0usize, 0usize);
    for entry in &manifest.entries {
        info!(entry = %entry.name, path = %entry.path, "auditing suite entry");
        let started = Instant::now();
        let outcome = audit_entry(entry, base_dir);
        let duration_ms = started.elapsed().as_millis() as u64;

        let (actual_verdict, status, violations, error) = match outcome {
            Ok(result) => {
                let actual = Verdict::from_passed(result.passed).as_str();
                let status = if actual == entry.expected_verdict {
                    passed += 1;
                    "match"
                } else {
                    failed += 1;
                    "mismatch"
                };
                let violations = result.violations.iter().map(render_violation).collect();
                (actual.to_string(), status, violations, None)
            }
            Err(e) => {
                errors += 1;
                ("error".to_string(), "error", Vec::new(), Some(e.to_string()))
            }
        };

        entries.push(SuiteEntryReport {
            name: entry.name.clone(),
            protocol: entry.protocol.clone(),
            path: entry.path.clone(),
            expected_verdict: entry.expected_verdict.clone(),
            actual_verdict,
            status: status.to_string(),
            duration_ms,
            violations,
            error,
        });
    }

    let overall = if failed == 0 && errors == 0 {
        "pass"
    } else {
        "fail"
    };
    Ok(SuiteReport {
        schema_version: AUDIT_MANIFEST_SCHEMA_VERSION,
        suite_name: manifest.suite_name,
        manifest_path: manifest_path.display().to_string(),
        entries,
        passed,
        failed,
        errors,
        overall: overall.to_string(),
    })
}

fn render_suite_text(report: &SuiteReport) -> String {
    let mut out = format!("Suite: {}\n", report.suite_name);
    for entry in &report.entries {
        out.push_str(&format!(
            "  [{}] {} ({}): expected {}, got {}\n",
            entry.status.to_uppercase(),
            entry.name,
            entry.protocol,
            entry.expected_verdict,
            entry.actual_verdict
        ));
        if let Some(error) = &entry.error {
            out.push_str(&format!("      error: {error}\n"));
        }
    }
    out.push_str(&format!(
        "Summary: {} matched, {} mismatched, {} errors => {}\n",
        report.passed,
        report.failed,
        report.errors,
        report.overall.to_uppercase()
    ));
    out
}

pub(crate) fn run_suite_command(
    manifest: &Path,
    format: &str,
    out: Option<&Path>,
) -> miette::Result<Verdict> {
    let format = parse_output_format(format);
    let report = run_suite(manifest)?;

    if let Some(path) = out {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).into_diagnostic()?;
        }
        fs::write(path, serde_json::to_string_pretty(&report).into_diagnostic()?)
            .into_diagnostic()?;
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
        }
        OutputFormat::Text => print!("{}", render_suite_text(&report)),
    }
    Ok(Verdict::from_passed(report.overall == "pass"))
}
