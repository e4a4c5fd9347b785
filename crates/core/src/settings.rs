use chrono::Duration;
use thiserror::Error;

use crate::time::SessionWindow;

/// Hard ceiling for a reported weight, in the unit weights are stored in.
pub const DEFAULT_MAX_WEIGHT: f64 = 500.0;
/// Load added on top of the last weight once every target set is done.
pub const DEFAULT_WEIGHT_INCREMENT: f64 = 1.25;
/// Minimum spacing between two submissions for the same exercise.
pub const DEFAULT_MIN_SUBMIT_INTERVAL_MS: u32 = 1_000;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("max weight must be a positive finite number, got {0}")]
    InvalidMaxWeight(f64),

    #[error("weight increment must be a positive finite number, got {0}")]
    InvalidWeightIncrement(f64),
}

/// Tunables for the progress engine.
///
/// `Default` yields the stock rules: 500 ceiling, +1.25 increment, 1 s between
/// submissions, sessions bounded by UTC midnight.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSettings {
    max_weight: f64,
    weight_increment: f64,
    min_submit_interval: Duration,
    session_window: SessionWindow,
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            max_weight: DEFAULT_MAX_WEIGHT,
            weight_increment: DEFAULT_WEIGHT_INCREMENT,
            min_submit_interval: Duration::milliseconds(i64::from(DEFAULT_MIN_SUBMIT_INTERVAL_MS)),
            session_window: SessionWindow::utc(),
        }
    }
}

impl ProgressSettings {
    /// Creates custom settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the ceiling or increment is not a positive number.
    pub fn new(
        max_weight: f64,
        weight_increment: f64,
        min_submit_interval_ms: u32,
        session_window: SessionWindow,
    ) -> Result<Self, SettingsError> {
        if !max_weight.is_finite() || max_weight <= 0.0 {
            return Err(SettingsError::InvalidMaxWeight(max_weight));
        }
        if !weight_increment.is_finite() || weight_increment <= 0.0 {
            return Err(SettingsError::InvalidWeightIncrement(weight_increment));
        }
        Ok(Self {
            max_weight,
            weight_increment,
            min_submit_interval: Duration::milliseconds(i64::from(min_submit_interval_ms)),
            session_window,
        })
    }

    #[must_use]
    pub fn with_session_window(mut self, window: SessionWindow) -> Self {
        self.session_window = window;
        self
    }

    #[must_use]
    pub fn max_weight(&self) -> f64 {
        self.max_weight
    }

    #[must_use]
    pub fn weight_increment(&self) -> f64 {
        self.weight_increment
    }

    #[must_use]
    pub fn min_submit_interval(&self) -> Duration {
        self.min_submit_interval
    }

    #[must_use]
    pub fn session_window(&self) -> SessionWindow {
        self.session_window
    }
}
