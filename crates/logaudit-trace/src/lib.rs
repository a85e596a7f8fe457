//! Typed records for audited process logs.
//!
//! These types represent what a process of a broadcast or lattice agreement
//! run writes to its output file, after parsing. They carry no checking logic;
//! the invariant models and checkers live in `logaudit-conformance`.

pub mod broadcast;
pub mod lattice;
pub mod process;

pub use broadcast::{BroadcastEvent, BroadcastLog, LoggedEvent};
pub use lattice::{value_set, LatticeConfig, LatticeLog, LatticeValue, ValueSet};
pub use process::ProcessIndex;
