use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::ids::{ExerciseId, SetRecordId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum SetRecordError {
    #[error("set index must be >= 1")]
    InvalidSetIndex,

    #[error("reps must be >= 1")]
    InvalidReps,

    #[error("weight must be a finite, non-negative number, got {0}")]
    InvalidWeight(f64),
}

fn check_values(weight: f64, reps: u32) -> Result<(), SetRecordError> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(SetRecordError::InvalidWeight(weight));
    }
    if reps == 0 {
        return Err(SetRecordError::InvalidReps);
    }
    Ok(())
}

//
// ─── SET RECORD ────────────────────────────────────────────────────────────────
//

/// One logged set of an exercise.
///
/// `session_date` is the calendar day of the session window the set was logged in;
/// together with `exercise_id` and `set_index` it identifies the set uniquely.
/// Only `weight` and `reps` change after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRecord {
    id: SetRecordId,
    exercise_id: ExerciseId,
    set_index: u32,
    weight: f64,
    reps: u32,
    completed_at: DateTime<Utc>,
    session_date: NaiveDate,
}

impl SetRecord {
    /// Rehydrate a record from storage.
    ///
    /// # Errors
    ///
    /// Returns `SetRecordError` if the stored values violate invariants.
    pub fn from_persisted(
        id: SetRecordId,
        exercise_id: ExerciseId,
        set_index: u32,
        weight: f64,
        reps: u32,
        completed_at: DateTime<Utc>,
        session_date: NaiveDate,
    ) -> Result<Self, SetRecordError> {
        if set_index == 0 {
            return Err(SetRecordError::InvalidSetIndex);
        }
        check_values(weight, reps)?;
        Ok(Self {
            id,
            exercise_id,
            set_index,
            weight,
            reps,
            completed_at,
            session_date,
        })
    }

    #[must_use]
    pub fn id(&self) -> SetRecordId {
        self.id
    }

    #[must_use]
    pub fn exercise_id(&self) -> ExerciseId {
        self.exercise_id
    }

    /// 1-based position of the set within its session.
    #[must_use]
    pub fn set_index(&self) -> u32 {
        self.set_index
    }

    #[must_use]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    #[must_use]
    pub fn reps(&self) -> u32 {
        self.reps
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn session_date(&self) -> NaiveDate {
        self.session_date
    }

    /// Overwrite weight and reps in place.
    ///
    /// # Errors
    ///
    /// Returns `SetRecordError` and leaves the record unchanged if the values are invalid.
    pub fn apply_correction(&mut self, weight: f64, reps: u32) -> Result<(), SetRecordError> {
        check_values(weight, reps)?;
        self.weight = weight;
        self.reps = reps;
        Ok(())
    }
}

/// Values for a set that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSetRecord {
    pub exercise_id: ExerciseId,
    pub session_date: NaiveDate,
    pub set_index: u32,
    pub weight: f64,
    pub reps: u32,
    pub completed_at: DateTime<Utc>,
}

impl NewSetRecord {
    /// Attach the store-assigned id.
    ///
    /// # Errors
    ///
    /// Returns `SetRecordError` if the values violate invariants.
    pub fn into_record(self, id: SetRecordId) -> Result<SetRecord, SetRecordError> {
        SetRecord::from_persisted(
            id,
            self.exercise_id,
            self.set_index,
            self.weight,
            self.reps,
            self.completed_at,
            self.session_date,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn new_set(index: u32) -> NewSetRecord {
        NewSetRecord {
            exercise_id: ExerciseId::new(3),
            session_date: fixed_now().date_naive(),
            set_index: index,
            weight: 20.0,
            reps: 8,
            completed_at: fixed_now(),
        }
    }

    #[test]
    fn zero_index_is_rejected() {
        let err = new_set(0).into_record(SetRecordId::new(1)).unwrap_err();
        assert_eq!(err, SetRecordError::InvalidSetIndex);
    }

    #[test]
    fn correction_changes_only_weight_and_reps() {
        let mut record = new_set(2).into_record(SetRecordId::new(5)).unwrap();
        record.apply_correction(22.5, 6).unwrap();
        assert_eq!(record.weight(), 22.5);
        assert_eq!(record.reps(), 6);
        assert_eq!(record.set_index(), 2);
        assert_eq!(record.completed_at(), fixed_now());

        assert!(record.apply_correction(-1.0, 6).is_err());
        assert!(record.apply_correction(10.0, 0).is_err());
        assert_eq!(record.weight(), 22.5);
    }

    #[test]
    fn serializes_in_camel_case() {
        let record = new_set(1).into_record(SetRecordId::new(1)).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["setIndex"], 1);
        assert_eq!(json["exerciseId"], 3);
        assert_eq!(json["sessionDate"], "2023-11-15");
    }
}
