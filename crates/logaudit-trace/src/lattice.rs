//! Lattice-agreement round records.
//!
//! A lattice run pairs every `<stem>.output` with a `<stem>.config`. The
//! config header holds `<requiredAgreementRounds> <maxRounds>` and every
//! following line is one round's proposal; the output holds one decided set
//! per round in the same order.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use crate::process::ProcessIndex;

/// A proposed or decided value.
///
/// Values are opaque whitespace-free tokens compared by exact text, so `01`
/// and `1` are distinct values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(transparent))]
pub struct LatticeValue(String);

impl LatticeValue {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LatticeValue {
    fn from(v: &str) -> Self {
        Self(v.to_owned())
    }
}

impl fmt::Display for LatticeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Set of values proposed or decided in one round.
pub type ValueSet = BTreeSet<LatticeValue>;

/// Split a line into a value set. Repeated tokens collapse.
#[must_use]
pub fn value_set(line: &str) -> ValueSet {
    line.split_whitespace().map(LatticeValue::from).collect()
}

/// Contents of one `.config` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct LatticeConfig {
    /// Number of rounds that must be paired and checked.
    pub required_agreement_rounds: usize,
    /// Upper bound on rounds. Recorded only.
    pub max_rounds: usize,
    /// Proposal of each round, header excluded.
    pub proposals: Vec<ValueSet>,
}

/// Parsed output of one process in a lattice run together with its config.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct LatticeLog {
    pub process: ProcessIndex,
    pub output_source: PathBuf,
    pub config_source: PathBuf,
    pub config: LatticeConfig,
    /// Decided set of each round, in output order.
    pub decisions: Vec<ValueSet>,
}

impl LatticeLog {
    /// Rounds paired by position, limited by the shorter side.
    pub fn rounds(&self) -> impl Iterator<Item = (usize, &ValueSet, &ValueSet)> {
        self.config
            .proposals
            .iter()
            .zip(self.decisions.iter())
            .enumerate()
            .map(|(i, (proposed, decided))| (i + 1, proposed, decided))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_set_collapses_duplicates() {
        let set = value_set("a b a  c\t b");
        let tokens: Vec<&str> = set.iter().map(LatticeValue::as_str).collect();
        assert_eq!(tokens, vec!["a", "b", "c"]);
    }

    #[test]
    fn value_set_of_blank_line_is_empty() {
        assert!(value_set("   ").is_empty());
    }

    #[test]
    fn rounds_stop_at_shorter_side() {
        let log = LatticeLog {
            config: LatticeConfig {
                required_agreement_rounds: 3,
                max_rounds: 5,
                proposals: vec![value_set("1"), value_set("2"), value_set("3")],
            },
            decisions: vec![value_set("1 2"), value_set("2 3")],
            ..LatticeLog::default()
        };
        let rounds: Vec<usize> = log.rounds().map(|(r, _, _)| r).collect();
        assert_eq!(rounds, vec![1, 2]);
    }
}
