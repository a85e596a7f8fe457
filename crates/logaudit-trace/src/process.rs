//! Process identity.

use std::fmt;

/// Zero-based position of a process in a discovered run.
///
/// Log lines refer to peers by a 1-based host id; [`ProcessIndex::host_id`]
/// maps an index into that space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(transparent))]
pub struct ProcessIndex(pub usize);

impl ProcessIndex {
    /// The 1-based id this process uses as `senderId` in delivery lines.
    #[must_use]
    pub fn host_id(self) -> u64 {
        self.0 as u64 + 1
    }
}

impl From<usize> for ProcessIndex {
    fn from(v: usize) -> Self {
        Self(v)
    }
}

impl fmt::Display for ProcessIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_id_is_one_based() {
        assert_eq!(ProcessIndex(0).host_id(), 1);
        assert_eq!(ProcessIndex(4).host_id(), 5);
    }
}
