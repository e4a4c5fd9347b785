//! Shared error types for the services crate.

use chrono::Duration;
use thiserror::Error;

use lift_core::model::{ExerciseError, WorkoutError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Rejections of a set report's values. Values are never clamped.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum InputError {
    #[error("reps must be provided")]
    MissingReps,

    #[error("reps must be a positive integer, got {0}")]
    InvalidReps(i64),

    #[error("weight must be a finite number")]
    NonFiniteWeight,

    #[error("weight must be between 0 and {max}, got {weight}")]
    WeightOutOfRange { weight: f64, max: f64 },
}

/// Errors emitted by `ProgressService`.
///
/// A storage `Conflict` raised while registering a set is recovered internally and
/// never reaches callers as such.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),

    #[error("exercise belongs to another user")]
    Forbidden,

    #[error("not found")]
    NotFound,

    #[error("submitted too quickly; retry in {} ms", .retry_after.num_milliseconds())]
    RateLimited { retry_after: Duration },

    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for ProgressError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => Self::NotFound,
            other => Self::Storage(other),
        }
    }
}

/// Errors emitted by `WorkoutService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WorkoutServiceError {
    #[error(transparent)]
    Workout(#[from] WorkoutError),

    #[error(transparent)]
    Exercise(#[from] ExerciseError),

    #[error(transparent)]
    InvalidInput(#[from] InputError),

    #[error("workout belongs to another user")]
    Forbidden,

    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for WorkoutServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => Self::NotFound,
            other => Self::Storage(other),
        }
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
