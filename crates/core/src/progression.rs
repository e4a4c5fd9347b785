//! Progressive-overload weight suggestion.
//!
//! Deterministic and history-free: only the last weight lifted is consulted.

use crate::settings::DEFAULT_WEIGHT_INCREMENT;

/// Fixed-increment progression rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressionPolicy {
    increment: f64,
}

impl Default for ProgressionPolicy {
    fn default() -> Self {
        Self {
            increment: DEFAULT_WEIGHT_INCREMENT,
        }
    }
}

impl ProgressionPolicy {
    #[must_use]
    pub fn with_increment(increment: f64) -> Self {
        Self { increment }
    }

    #[must_use]
    pub fn increment(&self) -> f64 {
        self.increment
    }

    /// Weight to attempt next session after completing every target set at `last_weight`.
    ///
    /// Returns `None` when `last_weight` is zero: an unloaded session says nothing
    /// about whether the load can go up.
    #[must_use]
    pub fn suggest_next_weight(&self, last_weight: f64) -> Option<f64> {
        (last_weight > 0.0).then(|| last_weight + self.increment)
    }
}

/// [`ProgressionPolicy::suggest_next_weight`] with the default increment.
#[must_use]
pub fn suggest_next_weight(last_weight: f64) -> Option<f64> {
    ProgressionPolicy::default().suggest_next_weight(last_weight)
}
