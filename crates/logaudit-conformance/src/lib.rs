//! Offline safety auditing of distributed protocol runs.
//!
//! Reads the per-process logs a broadcast or lattice agreement run leaves in
//! a directory, rebuilds the expected invariant from the run parameters or
//! the paired config files, and reports every safety violation found.

pub mod audit;
pub mod checker;
pub mod discovery;
pub mod manifest;
pub mod model;
pub mod parse;
pub mod reader;

pub use audit::{audit_broadcast, audit_entry, audit_lattice};
pub use checker::{
    BroadcastChecker, CheckResult, CheckerOptions, LatticeChecker, ReportMode, RoundPolicy,
    Violation, ViolationKind,
};
pub use reader::ReadError;
