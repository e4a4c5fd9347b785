use std::sync::Arc;

use chrono::Weekday;
use serde::Serialize;
use tracing::{info, warn};

use lift_core::model::{
    Exercise, ExerciseDraft, ExerciseId, ExercisePatch, UserId, Workout, WorkoutId,
    validate_workout_name,
};
use lift_core::{ProgressSettings, SessionWindow};
use storage::repository::{ExerciseRepository, NewWorkoutRecord, Storage, WorkoutRepository};

use crate::Clock;
use crate::error::WorkoutServiceError;
use crate::wire::validate_weight;

/// A workout together with its exercises.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutPlan {
    #[serde(flatten)]
    pub workout: Workout,
    pub exercises: Vec<Exercise>,
}

/// Orchestrates workout and exercise definitions for a user.
#[derive(Clone)]
pub struct WorkoutService {
    clock: Clock,
    window: SessionWindow,
    max_weight: f64,
    workouts: Arc<dyn WorkoutRepository>,
    exercises: Arc<dyn ExerciseRepository>,
}

impl WorkoutService {
    #[must_use]
    pub fn new(
        clock: Clock,
        workouts: Arc<dyn WorkoutRepository>,
        exercises: Arc<dyn ExerciseRepository>,
    ) -> Self {
        let settings = ProgressSettings::default();
        Self {
            clock,
            window: settings.session_window(),
            max_weight: settings.max_weight(),
            workouts,
            exercises,
        }
    }

    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage) -> Self {
        Self::new(
            clock,
            Arc::clone(&storage.workouts),
            Arc::clone(&storage.exercises),
        )
    }

    /// Use the weight ceiling and session window of `settings`.
    #[must_use]
    pub fn with_settings(mut self, settings: &ProgressSettings) -> Self {
        self.window = settings.session_window();
        self.max_weight = settings.max_weight();
        self
    }

    //
    // ─── WORKOUTS ──────────────────────────────────────────────────────────────
    //

    /// Create a workout scheduled on `day`.
    ///
    /// # Errors
    ///
    /// Returns `WorkoutServiceError::Workout` if the name is invalid.
    /// Returns `WorkoutServiceError::Storage` if persistence fails.
    pub async fn create_workout(
        &self,
        user_id: UserId,
        name: &str,
        day: Weekday,
    ) -> Result<Workout, WorkoutServiceError> {
        let name = validate_workout_name(name)?;
        let workout = self
            .workouts
            .insert_workout(NewWorkoutRecord {
                user_id,
                name,
                day,
                created_at: self.clock.now(),
            })
            .await?;
        info!(%user_id, workout_id = %workout.id(), "workout created");
        Ok(workout)
    }

    /// All of the user's workouts with their exercises.
    ///
    /// # Errors
    ///
    /// Returns `WorkoutServiceError::Storage` if repository access fails.
    pub async fn list_workouts(
        &self,
        user_id: UserId,
    ) -> Result<Vec<WorkoutPlan>, WorkoutServiceError> {
        let workouts = self.workouts.list_workouts(user_id).await?;
        self.with_exercises(workouts).await
    }

    /// The user's workouts scheduled on `day`.
    ///
    /// # Errors
    ///
    /// Returns `WorkoutServiceError::Storage` if repository access fails.
    pub async fn workout_for_day(
        &self,
        user_id: UserId,
        day: Weekday,
    ) -> Result<Vec<WorkoutPlan>, WorkoutServiceError> {
        let workouts = self.workouts.workouts_for_day(user_id, day).await?;
        self.with_exercises(workouts).await
    }

    /// Workouts for the current weekday in the session window's offset.
    ///
    /// # Errors
    ///
    /// Returns `WorkoutServiceError::Storage` if repository access fails.
    pub async fn workout_of_the_day(
        &self,
        user_id: UserId,
    ) -> Result<Vec<WorkoutPlan>, WorkoutServiceError> {
        let today = self.window.weekday(self.clock.now());
        self.workout_for_day(user_id, today).await
    }

    /// Delete a workout, its exercises and their set logs.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Forbidden`, or `Storage`.
    pub async fn delete_workout(
        &self,
        user_id: UserId,
        workout_id: WorkoutId,
    ) -> Result<(), WorkoutServiceError> {
        self.owned_workout(user_id, workout_id).await?;
        self.workouts.delete_workout(workout_id).await?;
        info!(%user_id, %workout_id, "workout deleted");
        Ok(())
    }

    //
    // ─── EXERCISES ─────────────────────────────────────────────────────────────
    //

    /// Append an exercise to one of the user's workouts.
    ///
    /// # Errors
    ///
    /// Returns `Exercise` for an invalid draft, plus `NotFound`, `Forbidden`, or `Storage`.
    pub async fn add_exercise(
        &self,
        user_id: UserId,
        workout_id: WorkoutId,
        draft: ExerciseDraft,
    ) -> Result<Exercise, WorkoutServiceError> {
        self.owned_workout(user_id, workout_id).await?;
        let draft = draft.validate()?;
        if let Some(weight) = draft.target_weight {
            validate_weight(weight, self.max_weight)?;
        }
        let exercise = self.exercises.insert_exercise(workout_id, draft).await?;
        info!(%workout_id, exercise_id = %exercise.id(), "exercise added");
        Ok(exercise)
    }

    /// Exercises of one of the user's workouts.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Forbidden`, or `Storage`.
    pub async fn list_exercises(
        &self,
        user_id: UserId,
        workout_id: WorkoutId,
    ) -> Result<Vec<Exercise>, WorkoutServiceError> {
        self.owned_workout(user_id, workout_id).await?;
        Ok(self.exercises.list_exercises(workout_id).await?)
    }

    /// Edit an exercise's name or targets.
    ///
    /// Session status is derived from the current targets, so an edit takes effect on
    /// the next status computation.
    ///
    /// # Errors
    ///
    /// Returns `Exercise` for an invalid patch, plus `NotFound`, `Forbidden`, or `Storage`.
    pub async fn update_exercise(
        &self,
        user_id: UserId,
        exercise_id: ExerciseId,
        patch: ExercisePatch,
    ) -> Result<Exercise, WorkoutServiceError> {
        let mut exercise = self.owned_exercise(user_id, exercise_id).await?;
        if let Some(Some(weight)) = patch.target_weight {
            validate_weight(weight, self.max_weight)?;
        }
        exercise.apply_patch(patch)?;
        self.exercises.update_exercise(&exercise).await?;
        info!(%exercise_id, "exercise updated");
        Ok(exercise)
    }

    /// Delete an exercise and its set log.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Forbidden`, or `Storage`.
    pub async fn delete_exercise(
        &self,
        user_id: UserId,
        exercise_id: ExerciseId,
    ) -> Result<(), WorkoutServiceError> {
        self.owned_exercise(user_id, exercise_id).await?;
        self.exercises.delete_exercise(exercise_id).await?;
        info!(%exercise_id, "exercise deleted");
        Ok(())
    }

    /// Make `weight` the exercise's target, typically after a suggestion.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` outside `0..=max weight`, plus `NotFound`, `Forbidden`,
    /// or `Storage`.
    pub async fn adopt_suggested_weight(
        &self,
        user_id: UserId,
        exercise_id: ExerciseId,
        weight: f64,
    ) -> Result<Exercise, WorkoutServiceError> {
        let weight = validate_weight(weight, self.max_weight)?;
        let mut exercise = self.owned_exercise(user_id, exercise_id).await?;
        exercise.set_target_weight(Some(weight))?;
        self.exercises.update_exercise(&exercise).await?;
        info!(%exercise_id, weight, "target weight adopted");
        Ok(exercise)
    }

    async fn with_exercises(
        &self,
        workouts: Vec<Workout>,
    ) -> Result<Vec<WorkoutPlan>, WorkoutServiceError> {
        let mut plans = Vec::with_capacity(workouts.len());
        for workout in workouts {
            let exercises = self.exercises.list_exercises(workout.id()).await?;
            plans.push(WorkoutPlan { workout, exercises });
        }
        Ok(plans)
    }

    async fn owned_workout(
        &self,
        user_id: UserId,
        workout_id: WorkoutId,
    ) -> Result<Workout, WorkoutServiceError> {
        let workout = self
            .workouts
            .get_workout(workout_id)
            .await?
            .ok_or(WorkoutServiceError::NotFound)?;
        if !workout.is_owned_by(user_id) {
            warn!(%user_id, %workout_id, "workout belongs to another user");
            return Err(WorkoutServiceError::Forbidden);
        }
        Ok(workout)
    }

    async fn owned_exercise(
        &self,
        user_id: UserId,
        exercise_id: ExerciseId,
    ) -> Result<Exercise, WorkoutServiceError> {
        let exercise = self
            .exercises
            .get_exercise(exercise_id)
            .await?
            .ok_or(WorkoutServiceError::NotFound)?;
        self.owned_workout(user_id, exercise.workout_id()).await?;
        Ok(exercise)
    }
}
