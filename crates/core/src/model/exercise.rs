use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ExerciseId, WorkoutId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ExerciseError {
    #[error("exercise name cannot be empty")]
    EmptyName,

    #[error("target sets must be >= 1")]
    InvalidSets,

    #[error("target reps must be >= 1")]
    InvalidReps,

    #[error("target weight must be a finite, non-negative number, got {0}")]
    InvalidTargetWeight(f64),
}

fn check_target_weight(weight: Option<f64>) -> Result<Option<f64>, ExerciseError> {
    match weight {
        Some(w) if !w.is_finite() || w < 0.0 => Err(ExerciseError::InvalidTargetWeight(w)),
        other => Ok(other),
    }
}

//
// ─── DRAFT / PATCH ─────────────────────────────────────────────────────────────
//

/// User input for a new exercise, prior to validation and id assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseDraft {
    pub name: String,
    pub sets: u32,
    pub reps: u32,
    #[serde(default)]
    pub target_weight: Option<f64>,
}

impl ExerciseDraft {
    #[must_use]
    pub fn new(name: impl Into<String>, sets: u32, reps: u32) -> Self {
        Self {
            name: name.into(),
            sets,
            reps,
            target_weight: None,
        }
    }

    #[must_use]
    pub fn with_target_weight(mut self, weight: f64) -> Self {
        self.target_weight = Some(weight);
        self
    }

    /// Check the draft and return it with the name trimmed.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError` for an empty name, zero sets/reps or a bad weight.
    pub fn validate(self) -> Result<Self, ExerciseError> {
        let name = self.name.trim().to_owned();
        if name.is_empty() {
            return Err(ExerciseError::EmptyName);
        }
        if self.sets == 0 {
            return Err(ExerciseError::InvalidSets);
        }
        if self.reps == 0 {
            return Err(ExerciseError::InvalidReps);
        }
        let target_weight = check_target_weight(self.target_weight)?;
        Ok(Self {
            name,
            sets: self.sets,
            reps: self.reps,
            target_weight,
        })
    }
}

/// Partial edit of an exercise. `None` leaves a field untouched;
/// `target_weight: Some(None)` clears the target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExercisePatch {
    pub name: Option<String>,
    pub sets: Option<u32>,
    pub reps: Option<u32>,
    pub target_weight: Option<Option<f64>>,
}

//
// ─── EXERCISE ──────────────────────────────────────────────────────────────────
//

/// One movement inside a workout with its per-session targets.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    id: ExerciseId,
    workout_id: WorkoutId,
    name: String,
    sets: u32,
    reps: u32,
    target_weight: Option<f64>,
}

impl Exercise {
    /// Build an exercise from a draft once storage has assigned an id.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError` if the draft is invalid.
    pub fn from_draft(
        id: ExerciseId,
        workout_id: WorkoutId,
        draft: ExerciseDraft,
    ) -> Result<Self, ExerciseError> {
        let draft = draft.validate()?;
        Ok(Self {
            id,
            workout_id,
            name: draft.name,
            sets: draft.sets,
            reps: draft.reps,
            target_weight: draft.target_weight,
        })
    }

    /// Rehydrate an exercise from persisted columns.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError` if the stored values violate invariants.
    pub fn from_persisted(
        id: ExerciseId,
        workout_id: WorkoutId,
        name: String,
        sets: u32,
        reps: u32,
        target_weight: Option<f64>,
    ) -> Result<Self, ExerciseError> {
        Self::from_draft(
            id,
            workout_id,
            ExerciseDraft {
                name,
                sets,
                reps,
                target_weight,
            },
        )
    }

    #[must_use]
    pub fn id(&self) -> ExerciseId {
        self.id
    }

    #[must_use]
    pub fn workout_id(&self) -> WorkoutId {
        self.workout_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Target number of sets per session. Always >= 1.
    #[must_use]
    pub fn sets(&self) -> u32 {
        self.sets
    }

    #[must_use]
    pub fn reps(&self) -> u32 {
        self.reps
    }

    #[must_use]
    pub fn target_weight(&self) -> Option<f64> {
        self.target_weight
    }

    /// Apply an edit. The exercise is left unchanged when the edit is invalid.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError` if the patched values violate invariants.
    pub fn apply_patch(&mut self, patch: ExercisePatch) -> Result<(), ExerciseError> {
        let draft = ExerciseDraft {
            name: patch.name.unwrap_or_else(|| self.name.clone()),
            sets: patch.sets.unwrap_or(self.sets),
            reps: patch.reps.unwrap_or(self.reps),
            target_weight: patch.target_weight.unwrap_or(self.target_weight),
        }
        .validate()?;

        self.name = draft.name;
        self.sets = draft.sets;
        self.reps = draft.reps;
        self.target_weight = draft.target_weight;
        Ok(())
    }

    /// Replace the target weight, e.g. when adopting a progression suggestion.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError::InvalidTargetWeight` for negative or non-finite values.
    pub fn set_target_weight(&mut self, weight: Option<f64>) -> Result<(), ExerciseError> {
        self.target_weight = check_target_weight(weight)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bench_press() -> Exercise {
        Exercise::from_draft(
            ExerciseId::new(1),
            WorkoutId::new(1),
            ExerciseDraft::new("Bench press", 3, 10).with_target_weight(40.0),
        )
        .unwrap()
    }

    #[test]
    fn draft_validation_rejects_bad_targets() {
        assert_eq!(
            ExerciseDraft::new(" ", 3, 10).validate(),
            Err(ExerciseError::EmptyName)
        );
        assert_eq!(
            ExerciseDraft::new("Row", 0, 10).validate(),
            Err(ExerciseError::InvalidSets)
        );
        assert_eq!(
            ExerciseDraft::new("Row", 3, 0).validate(),
            Err(ExerciseError::InvalidReps)
        );
        assert!(matches!(
            ExerciseDraft::new("Row", 3, 8)
                .with_target_weight(-1.0)
                .validate(),
            Err(ExerciseError::InvalidTargetWeight(_))
        ));
    }

    #[test]
    fn patch_updates_only_given_fields() {
        let mut ex = bench_press();
        ex.apply_patch(ExercisePatch {
            sets: Some(5),
            ..ExercisePatch::default()
        })
        .unwrap();
        assert_eq!(ex.sets(), 5);
        assert_eq!(ex.reps(), 10);
        assert_eq!(ex.target_weight(), Some(40.0));

        ex.apply_patch(ExercisePatch {
            target_weight: Some(None),
            ..ExercisePatch::default()
        })
        .unwrap();
        assert_eq!(ex.target_weight(), None);
    }

    #[test]
    fn invalid_patch_leaves_exercise_untouched() {
        let mut ex = bench_press();
        let before = ex.clone();
        let err = ex
            .apply_patch(ExercisePatch {
                sets: Some(0),
                name: Some("Incline".into()),
                ..ExercisePatch::default()
            })
            .unwrap_err();
        assert_eq!(err, ExerciseError::InvalidSets);
        assert_eq!(ex, before);
    }

    #[test]
    fn target_weight_can_be_adopted() {
        let mut ex = bench_press();
        ex.set_target_weight(Some(41.25)).unwrap();
        assert_eq!(ex.target_weight(), Some(41.25));
        assert!(ex.set_target_weight(Some(f64::NAN)).is_err());
    }
}
