use serde::{Deserialize, Serialize};
use warbler_social::DEFAULT_TIMELINE_LIMIT;

/// Tunables for guarded operations.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Maximum number of posts on a home timeline.
    pub timeline_limit: usize,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            timeline_limit: DEFAULT_TIMELINE_LIMIT,
        }
    }
}
