//! State transition guards.

use serde::Deserialize;

/// Optional guards on administrative transitions.
///
/// Both default off, which permits re-review of an already reviewed
/// creative or campaign and failing a recharge in any state.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TransitionPolicy {
    /// Reviews only apply to `Pending` creatives and campaigns.
    pub review_requires_pending: bool,
    /// Only `Pending` recharges can be marked `Failed`.
    pub fail_requires_pending: bool,
}

impl TransitionPolicy {
    /// Both guards on.
    pub fn strict() -> Self {
        Self {
            review_requires_pending: true,
            fail_requires_pending: true,
        }
    }
}
