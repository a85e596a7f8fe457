//! One-call audits of a run directory: read, model, check.

use std::path::Path;

use tracing::info;

use crate::checker::{BroadcastChecker, CheckResult, CheckerOptions, LatticeChecker};
use crate::manifest::AuditManifestEntry;
use crate::parse::ProtocolKind;
use crate::reader::{read_broadcast_run, read_lattice_run, ReadError};

/// Audit a broadcast run of `num_processes` processes that each broadcast
/// `num_messages` messages.
pub fn audit_broadcast(
    dir: &Path,
    num_processes: usize,
    num_messages: u64,
    options: CheckerOptions,
) -> Result<CheckResult, ReadError> {
    let logs = read_broadcast_run(dir)?;
    info!(
        dir = %dir.display(),
        files = logs.len(),
        num_processes,
        num_messages,
        "checking broadcast run"
    );
    Ok(BroadcastChecker::new_with_options(num_processes, num_messages, options).check(&logs))
}

/// Audit a lattice agreement run.
pub fn audit_lattice(dir: &Path, options: CheckerOptions) -> Result<CheckResult, ReadError> {
    let logs = read_lattice_run(dir)?;
    info!(dir = %dir.display(), files = logs.len(), "checking lattice run");
    Ok(LatticeChecker::new_with_options(options).check(&logs))
}

/// Audit the run a manifest entry points at. The entry must have passed
/// [`crate::manifest::validate_manifest`].
pub fn audit_entry(entry: &AuditManifestEntry, base_dir: &Path) -> Result<CheckResult, ReadError> {
    let options = CheckerOptions {
        report: entry.report_mode,
        round_policy: entry.round_policy,
        fifo: entry.fifo,
        cross_process: entry.cross_process,
    };
    let dir = entry.resolved_path(base_dir);
    let protocol = entry
        .protocol
        .parse::<ProtocolKind>()
        .map_err(|message| invalid_entry(entry, message))?;
    match protocol {
        ProtocolKind::Lattice => audit_lattice(&dir, options),
        ProtocolKind::Broadcast => {
            let (Some(num_processes), Some(num_messages)) =
                (entry.num_processes, entry.num_messages)
            else {
                return Err(invalid_entry(
                    entry,
                    "broadcast runs need num_processes and num_messages".to_string(),
                ));
            };
            audit_broadcast(&dir, num_processes, num_messages, options)
        }
    }
}

fn invalid_entry(entry: &AuditManifestEntry, message: String) -> ReadError {
    ReadError::InvalidEntry {
        name: entry.name.clone(),
        message,
    }
}
