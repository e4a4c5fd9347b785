use chrono::Weekday;
use lift_core::model::{
    Exercise, ExerciseId, SetRecord, SetRecordId, UserId, Workout, WorkoutId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Connection-level failures, with constraint violations mapped to their
/// domain meaning.
pub(crate) fn write_err(e: sqlx::Error) -> StorageError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => StorageError::NotFound,
        _ => StorageError::Connection(e.to_string()),
    }
}

pub(crate) fn read_err(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn weekday_to_i64(day: Weekday) -> i64 {
    i64::from(day.num_days_from_monday())
}

pub(crate) fn weekday_from_i64(v: i64) -> Result<Weekday, StorageError> {
    u8::try_from(v)
        .ok()
        .and_then(|n| Weekday::try_from(n).ok())
        .ok_or_else(|| StorageError::Serialization(format!("invalid day: {v}")))
}

pub(crate) fn map_workout_row(row: &SqliteRow) -> Result<Workout, StorageError> {
    Workout::from_persisted(
        WorkoutId::new(i64_to_u64("id", row.try_get("id").map_err(ser)?)?),
        UserId::new(i64_to_u64("user_id", row.try_get("user_id").map_err(ser)?)?),
        row.try_get::<String, _>("name").map_err(ser)?,
        weekday_from_i64(row.try_get("day").map_err(ser)?)?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_exercise_row(row: &SqliteRow) -> Result<Exercise, StorageError> {
    Exercise::from_persisted(
        ExerciseId::new(i64_to_u64("id", row.try_get("id").map_err(ser)?)?),
        WorkoutId::new(i64_to_u64(
            "workout_id",
            row.try_get("workout_id").map_err(ser)?,
        )?),
        row.try_get("name").map_err(ser)?,
        i64_to_u32("sets", row.try_get("sets").map_err(ser)?)?,
        i64_to_u32("reps", row.try_get("reps").map_err(ser)?)?,
        row.try_get("target_weight").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_set_row(row: &SqliteRow) -> Result<SetRecord, StorageError> {
    SetRecord::from_persisted(
        SetRecordId::new(i64_to_u64("id", row.try_get("id").map_err(ser)?)?),
        ExerciseId::new(i64_to_u64(
            "exercise_id",
            row.try_get("exercise_id").map_err(ser)?,
        )?),
        i64_to_u32("set_index", row.try_get("set_index").map_err(ser)?)?,
        row.try_get("weight").map_err(ser)?,
        i64_to_u32("reps", row.try_get("reps").map_err(ser)?)?,
        row.try_get("completed_at").map_err(ser)?,
        row.try_get("session_date").map_err(ser)?,
    )
    .map_err(ser)
}
