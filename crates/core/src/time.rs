use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Utc, Weekday,
};
use thiserror::Error;

/// A simple clock abstraction for deterministic time in services and tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock that uses the current system time.
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// If this is a fixed clock, advance it by the given duration.
    ///
    /// Has no effect on `Clock::Default`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }

    /// Returns true if this clock is fixed.
    #[must_use]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Clock::Fixed(_))
    }
}

//
// ─── SESSION WINDOW ────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionWindowError {
    #[error("utc offset must be within ±23:59, got {minutes} minutes")]
    InvalidOffset { minutes: i32 },
}

/// Calendar-day window that scopes a workout session.
///
/// A session runs from local midnight to the next local midnight, where "local"
/// is a fixed UTC offset. Set counts reset at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionWindow {
    offset: FixedOffset,
}

impl Default for SessionWindow {
    fn default() -> Self {
        Self::utc()
    }
}

impl SessionWindow {
    /// Window whose days start at midnight UTC.
    #[must_use]
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    /// Window whose days start at midnight of the given offset east of UTC.
    ///
    /// # Errors
    ///
    /// Returns `SessionWindowError::InvalidOffset` if the offset is a day or more.
    pub fn with_offset_minutes(minutes: i32) -> Result<Self, SessionWindowError> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(|offset| Self { offset })
            .ok_or(SessionWindowError::InvalidOffset { minutes })
    }

    #[must_use]
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// The session day that `at` falls into.
    #[must_use]
    pub fn session_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }

    /// The most recent session boundary at or before `at`.
    #[must_use]
    pub fn session_start(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        let local_midnight = self.session_date(at).and_time(NaiveTime::MIN);
        let utc_midnight =
            local_midnight - Duration::seconds(i64::from(self.offset.local_minus_utc()));
        DateTime::<Utc>::from_naive_utc_and_offset(utc_midnight, Utc)
    }

    /// Weekday of `at` in the window's offset; used to pick the workout of the day.
    #[must_use]
    pub fn weekday(&self, at: DateTime<Utc>) -> Weekday {
        self.session_date(at).weekday()
    }
}

/// Deterministic timestamp for tests and examples (2023-11-15T12:00:00Z, a Wednesday).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_049_600;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}
