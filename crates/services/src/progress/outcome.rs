use chrono::{DateTime, Utc};
use serde::Serialize;

use lift_core::SessionStatus;
use lift_core::model::{ExerciseId, SetRecord, WorkoutId};

/// Whether a registration stored a new row or corrected an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    Created,
    Updated,
}

/// Everything a caller needs after registering a set.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationResult {
    pub record: SetRecord,
    pub outcome: Outcome,
    /// Session status after the write.
    pub status: SessionStatus,
    pub is_completed: bool,
    pub suggested_weight: Option<f64>,
    pub message: String,
}

/// One logged set with the names needed to show it out of context.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub workout_id: WorkoutId,
    pub workout_name: String,
    pub exercise_id: ExerciseId,
    pub exercise_name: String,
    pub set: SetRecord,
}

impl HistoryEntry {
    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.set.completed_at()
    }
}

pub(crate) fn registration_message(
    outcome: Outcome,
    set_index: u32,
    target_sets: u32,
    just_completed: bool,
    suggested_weight: Option<f64>,
) -> String {
    match outcome {
        Outcome::Updated => format!("Set {set_index} updated"),
        Outcome::Created if set_index > target_sets => {
            format!("Extra set {} registered", set_index - target_sets)
        }
        Outcome::Created if just_completed => match suggested_weight {
            Some(weight) => format!("All sets completed! Try {weight}kg next time"),
            None => "All sets completed!".to_string(),
        },
        Outcome::Created => format!("Set {set_index} of {target_sets} registered"),
    }
}
