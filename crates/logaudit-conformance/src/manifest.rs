use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::checker::{ReportMode, RoundPolicy};
use crate::parse::{ProtocolKind, PROTOCOL_KINDS};

/// Current schema version for audit suite manifests.
pub const AUDIT_MANIFEST_SCHEMA_VERSION: u32 = 1;

/// A suite of recorded runs and the verdict each one is expected to get.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditManifest {
    /// Schema version (must be exactly 1).
    pub schema_version: u32,
    /// Human-readable name for this suite.
    pub suite_name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Ordered list of runs to audit.
    pub entries: Vec<AuditManifestEntry>,
}

/// A single run directory in a manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditManifestEntry {
    /// Unique name for this run.
    pub name: String,
    /// Protocol class (`broadcast` or `lattice`).
    pub protocol: String,
    /// Run directory, relative to the manifest file.
    pub path: String,
    /// Broadcast only: number of processes in the run.
    #[serde(default)]
    pub num_processes: Option<usize>,
    /// Broadcast only: messages broadcast by each process.
    #[serde(default)]
    pub num_messages: Option<u64>,
    #[serde(default)]
    pub round_policy: RoundPolicy,
    #[serde(default)]
    pub report_mode: ReportMode,
    #[serde(default)]
    pub fifo: bool,
    #[serde(default)]
    pub cross_process: bool,
    /// Expected verdict: `"pass"` or `"fail"`.
    pub expected_verdict: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl AuditManifestEntry {
    /// Run directory resolved against the manifest's directory.
    pub fn resolved_path(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(&self.path)
    }
}

/// Validation error for an audit manifest.
#[derive(Debug, Clone)]
pub struct ManifestValidationError {
    pub message: String,
}

impl std::fmt::Display for ManifestValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Validate an audit manifest and return every error found.
///
/// - `schema_version` must be exactly `AUDIT_MANIFEST_SCHEMA_VERSION`.
/// - `suite_name` and `entries` must be non-empty.
/// - Each entry `name` must be non-empty and unique.
/// - `protocol` must be `broadcast` or `lattice`.
/// - Broadcast entries need `num_processes` (positive) and `num_messages`.
/// - `expected_verdict` must be `"pass"` or `"fail"`.
pub fn validate_manifest(manifest: &AuditManifest) -> Vec<ManifestValidationError> {
    let mut errors = Vec::new();
    let mut error = |message: String| errors.push(ManifestValidationError { message });

    if manifest.schema_version != AUDIT_MANIFEST_SCHEMA_VERSION {
        error(format!(
            "schema_version must be {}, got {}",
            AUDIT_MANIFEST_SCHEMA_VERSION, manifest.schema_version
        ));
    }
    if manifest.suite_name.trim().is_empty() {
        error("suite_name must be non-empty".into());
    }
    if manifest.entries.is_empty() {
        error("entries must be non-empty".into());
    }

    let mut seen_names: HashSet<&str> = HashSet::new();
    for (i, entry) in manifest.entries.iter().enumerate() {
        let prefix = format!("entries[{i}]");

        if entry.name.trim().is_empty() {
            error(format!("{prefix}: name must be non-empty"));
        } else if !seen_names.insert(&entry.name) {
            error(format!("{prefix}: duplicate name '{}'", entry.name));
        }

        if entry.path.trim().is_empty() {
            error(format!("{prefix}: path must be non-empty"));
        }

        match entry.protocol.parse::<ProtocolKind>() {
            Ok(ProtocolKind::Broadcast) => {
                match entry.num_processes {
                    None => error(format!("{prefix}: broadcast entries need num_processes")),
                    Some(0) => error(format!("{prefix}: num_processes must be positive")),
                    Some(_) => {}
                }
                if entry.num_messages.is_none() {
                    error(format!("{prefix}: broadcast entries need num_messages"));
                }
            }
            Ok(ProtocolKind::Lattice) => {}
            Err(_) => error(format!(
                "{prefix}: protocol must be one of [{}], got '{}'",
                PROTOCOL_KINDS.join(", "),
                entry.protocol
            )),
        }

        if entry.expected_verdict != "pass" && entry.expected_verdict != "fail" {
            error(format!(
                "{prefix}: expected_verdict must be 'pass' or 'fail', got '{}'",
                entry.expected_verdict
            ));
        }
    }

    errors
}

/// Validate that every run directory exists relative to a base directory.
pub fn validate_manifest_paths(
    manifest: &AuditManifest,
    base_dir: &Path,
) -> Vec<ManifestValidationError> {
    manifest
        .entries
        .iter()
        .enumerate()
        .filter_map(|(i, entry)| {
            let resolved = entry.resolved_path(base_dir);
            (!resolved.is_dir()).then(|| ManifestValidationError {
                message: format!(
                    "entries[{i}]: path '{}' is not a directory (resolved: {})",
                    entry.path,
                    resolved.display()
                ),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_manifest() -> AuditManifest {
        AuditManifest {
            schema_version: 1,
            suite_name: "regression".into(),
            description: Some("Recorded runs".into()),
            entries: vec![AuditManifestEntry {
                name: "urb_3x2".into(),
                protocol: "broadcast".into(),
                path: "runs/urb_3x2".into(),
                num_processes: Some(3),
                num_messages: Some(2),
                round_policy: RoundPolicy::Truncate,
                report_mode: ReportMode::FailFast,
                fifo: false,
                cross_process: false,
                expected_verdict: "pass".into(),
                tags: vec!["broadcast".into()],
                notes: None,
            }],
        }
    }

    #[test]
    fn valid_manifest_passes_validation() {
        let errors = validate_manifest(&valid_manifest());
        assert!(
            errors.is_empty(),
            "errors: {:?}",
            errors.iter().map(|e| &e.message).collect::<Vec<_>>()
        );
    }

    #[test]
    fn wrong_schema_version_rejected() {
        let mut m = valid_manifest();
        m.schema_version = 2;
        let errors = validate_manifest(&m);
        assert!(errors.iter().any(|e| e.message.contains("schema_version")));
    }

    #[test]
    fn duplicate_names_rejected() {
        let mut m = valid_manifest();
        m.entries.push(m.entries[0].clone());
        let errors = validate_manifest(&m);
        assert!(errors.iter().any(|e| e.message.contains("duplicate name")));
    }

    #[test]
    fn broadcast_entry_needs_counts() {
        let mut m = valid_manifest();
        m.entries[0].num_processes = None;
        m.entries[0].num_messages = None;
        let errors = validate_manifest(&m);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn lattice_entry_needs_no_counts() {
        let mut m = valid_manifest();
        m.entries[0].protocol = "lattice".into();
        m.entries[0].num_processes = None;
        m.entries[0].num_messages = None;
        assert!(validate_manifest(&m).is_empty());
    }

    #[test]
    fn unknown_protocol_and_verdict_rejected() {
        let mut m = valid_manifest();
        m.entries[0].protocol = "paxos".into();
        m.entries[0].expected_verdict = "maybe".into();
        let errors = validate_manifest(&m);
        assert!(errors.iter().any(|e| e.message.contains("protocol must be one of")));
        assert!(errors.iter().any(|e| e.message.contains("expected_verdict")));
    }

    #[test]
    fn manifest_defaults_fill_optional_fields() {
        let raw = r#"{
            "schema_version": 1,
            "suite_name": "s",
            "entries": [
                {"name": "la", "protocol": "lattice", "path": "la", "expected_verdict": "fail"}
            ]
        }"#;
        let m: AuditManifest = serde_json::from_str(raw).expect("parse manifest");
        let entry = &m.entries[0];
        assert_eq!(entry.round_policy, RoundPolicy::Truncate);
        assert_eq!(entry.report_mode, ReportMode::FailFast);
        assert!(!entry.fifo && !entry.cross_process);
    }

    #[test]
    fn missing_run_directory_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let errors = validate_manifest_paths(&valid_manifest(), dir.path());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("runs/urb_3x2"));
    }
}
