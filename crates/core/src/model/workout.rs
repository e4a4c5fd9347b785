use chrono::{DateTime, Utc, Weekday};
use serde::Serialize;
use thiserror::Error;

use crate::model::ids::{UserId, WorkoutId};

const MAX_NAME_LEN: usize = 120;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum WorkoutError {
    #[error("workout name cannot be empty")]
    EmptyName,

    #[error("workout name is too long ({len} chars, max 120)")]
    NameTooLong { len: usize },

    #[error("unknown weekday: {0}")]
    InvalidDay(String),
}

/// Trim and validate a workout name.
///
/// # Errors
///
/// Returns `WorkoutError::EmptyName` for blank names and `NameTooLong` past the limit.
pub fn validate_workout_name(name: &str) -> Result<String, WorkoutError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(WorkoutError::EmptyName);
    }
    let len = trimmed.chars().count();
    if len > MAX_NAME_LEN {
        return Err(WorkoutError::NameTooLong { len });
    }
    Ok(trimmed.to_owned())
}

/// Parse a weekday such as `"Monday"` or `"mon"`.
///
/// # Errors
///
/// Returns `WorkoutError::InvalidDay` for anything chrono does not recognise.
pub fn parse_weekday(raw: &str) -> Result<Weekday, WorkoutError> {
    raw.trim()
        .parse::<Weekday>()
        .map_err(|_| WorkoutError::InvalidDay(raw.to_owned()))
}

/// Full English name, the form weekdays are shown in.
#[must_use]
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

//
// ─── WORKOUT ───────────────────────────────────────────────────────────────────
//

/// A named training plan scheduled on one weekday and owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    id: WorkoutId,
    user_id: UserId,
    name: String,
    #[serde(serialize_with = "serialize_day")]
    day: Weekday,
    created_at: DateTime<Utc>,
}

fn serialize_day<S: serde::Serializer>(day: &Weekday, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(weekday_name(*day))
}

impl Workout {
    /// Rehydrate a workout from storage, re-checking the name.
    ///
    /// # Errors
    ///
    /// Returns `WorkoutError` if the persisted name is no longer valid.
    pub fn from_persisted(
        id: WorkoutId,
        user_id: UserId,
        name: impl AsRef<str>,
        day: Weekday,
        created_at: DateTime<Utc>,
    ) -> Result<Self, WorkoutError> {
        Ok(Self {
            id,
            user_id,
            name: validate_workout_name(name.as_ref())?,
            day,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> WorkoutId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn day(&self) -> Weekday {
        self.day
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}
