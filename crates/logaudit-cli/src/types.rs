//! Shared types used across CLI commands and tests.

/// Exit status of a run whose logs violate a safety property.
pub(crate) const EXIT_VIOLATION: i32 = 1;
/// Exit status when the input cannot be read or parsed.
pub(crate) const EXIT_INPUT_ERROR: i32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Outcome of a command that ran to completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    pub(crate) fn from_passed(passed: bool) -> Self {
        if passed {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Verdict::Pass => "pass",
            Verdict::Fail => "fail",
        }
    }
}
