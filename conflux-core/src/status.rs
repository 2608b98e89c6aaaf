//! Resolution lifecycle status.

use serde::{Deserialize, Serialize};

/// Lifecycle of one keyed resolution.
///
/// `Done` and `Errored` are terminal: no transition leaves them except an
/// explicit reset, which returns the key to `NotStarted` under a new
/// generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    /// No resolution has been attempted for this key (or the key was reset).
    NotStarted,
    /// The external call has started but not yet completed.
    InFlight,
    /// The call succeeded; the cached value is present.
    Done,
    /// The call failed; the structured error is present.
    Errored,
}

impl ResolutionStatus {
    /// Whether this status admits no further transition without a reset.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Errored)
    }

    /// Whether the underlying operation has started but not completed.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::InFlight)
    }
}
