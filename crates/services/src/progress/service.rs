use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use lift_core::model::{
    Exercise, ExerciseId, NewSetRecord, SetRecord, SetRecordId, UserId, Workout,
};
use lift_core::{Clock, ProgressSettings, ProgressionPolicy, SessionStatus, session_status};
use storage::repository::{
    ExerciseRepository, SetLogStore, SetOrder, Storage, StorageError, WorkoutRepository,
};

use super::outcome::{HistoryEntry, Outcome, RegistrationResult, registration_message};
use crate::error::ProgressError;
use crate::rate_guard::{Admission, RateGuard};
use crate::wire::SetReport;

/// Registers sets and answers progress queries for a user's exercises.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    settings: ProgressSettings,
    policy: ProgressionPolicy,
    guard: RateGuard,
    workouts: Arc<dyn WorkoutRepository>,
    exercises: Arc<dyn ExerciseRepository>,
    sets: Arc<dyn SetLogStore>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        workouts: Arc<dyn WorkoutRepository>,
        exercises: Arc<dyn ExerciseRepository>,
        sets: Arc<dyn SetLogStore>,
    ) -> Self {
        let settings = ProgressSettings::default();
        Self {
            clock,
            policy: ProgressionPolicy::with_increment(settings.weight_increment()),
            guard: RateGuard::new(Arc::clone(&sets), settings.min_submit_interval()),
            settings,
            workouts,
            exercises,
            sets,
        }
    }

    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage) -> Self {
        Self::new(
            clock,
            Arc::clone(&storage.workouts),
            Arc::clone(&storage.exercises),
            Arc::clone(&storage.sets),
        )
    }

    /// Override the clock (usually for deterministic testing).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: ProgressSettings) -> Self {
        self.policy = ProgressionPolicy::with_increment(settings.weight_increment());
        self.guard = RateGuard::new(Arc::clone(&self.sets), settings.min_submit_interval());
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &ProgressSettings {
        &self.settings
    }

    //
    // ─── REGISTRATION ──────────────────────────────────────────────────────────
    //

    /// Register a set at the clock's current time.
    ///
    /// # Errors
    ///
    /// See [`ProgressService::register_set_at`].
    pub async fn register_set(
        &self,
        user_id: UserId,
        exercise_id: ExerciseId,
        report: SetReport,
    ) -> Result<RegistrationResult, ProgressError> {
        self.register_set_at(user_id, exercise_id, report, self.clock.now())
            .await
    }

    /// Register a set reported at `now`.
    ///
    /// The set takes the session's next index. If that slot is already taken, the
    /// existing record is corrected instead and the result says `Outcome::Updated`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the exercise or its workout does not exist.
    /// - `Forbidden` if the workout belongs to another user.
    /// - `InvalidInput` for missing/non-positive reps or an out-of-range weight.
    /// - `RateLimited` if the previous set for this exercise is too recent.
    /// - `Storage` for backend failures.
    pub async fn register_set_at(
        &self,
        user_id: UserId,
        exercise_id: ExerciseId,
        report: SetReport,
        now: DateTime<Utc>,
    ) -> Result<RegistrationResult, ProgressError> {
        let (_, exercise) = self.owned_exercise(user_id, exercise_id).await?;

        let valid = report
            .validate(self.settings.max_weight())
            .inspect_err(|err| warn!(%exercise_id, error = %err, "set report rejected"))?;

        if let Admission::Rejected { retry_after } = self.guard.check(exercise_id, now).await? {
            warn!(
                %exercise_id,
                retry_after_ms = retry_after.num_milliseconds(),
                "set submitted too quickly"
            );
            return Err(ProgressError::RateLimited { retry_after });
        }

        let session_date = self.settings.session_window().session_date(now);
        let session = self.sets.list_session(exercise_id, session_date).await?;
        let before = session_status(&exercise, &session);

        let weight = match valid.weight {
            Some(weight) => weight,
            None => {
                let resolved = resolve_weight(&exercise, &session);
                debug!(%exercise_id, weight = resolved, "weight resolved for bare report");
                resolved
            }
        };

        let set_index = before.next_set_index;
        let (record, outcome) = self
            .persist_at_index(
                &session,
                NewSetRecord {
                    exercise_id,
                    session_date,
                    set_index,
                    weight,
                    reps: valid.reps,
                    completed_at: now,
                },
            )
            .await?;

        let session = self.sets.list_session(exercise_id, session_date).await?;
        let status = session_status(&exercise, &session);
        let just_completed = !before.is_completed && status.is_completed;
        let suggested_weight = if just_completed && set_index <= status.target_sets {
            self.policy.suggest_next_weight(weight)
        } else {
            None
        };
        let status = status.with_suggested_weight(suggested_weight);
        let message = registration_message(
            outcome,
            set_index,
            status.target_sets,
            just_completed,
            suggested_weight,
        );

        info!(
            %user_id,
            %exercise_id,
            set_index,
            ?outcome,
            completed = status.is_completed,
            "set registered"
        );

        Ok(RegistrationResult {
            record,
            outcome,
            status,
            is_completed: status.is_completed,
            suggested_weight,
            message,
        })
    }

    /// Write `new` into its slot: correct an occupied slot, otherwise append.
    ///
    /// A `Conflict` from the store means another submission took the slot after
    /// `session` was read; that record is corrected instead.
    pub(crate) async fn persist_at_index(
        &self,
        session: &[SetRecord],
        new: NewSetRecord,
    ) -> Result<(SetRecord, Outcome), ProgressError> {
        if let Some(existing) = session.iter().find(|r| r.set_index() == new.set_index) {
            let updated = self.sets.update(existing.id(), new.weight, new.reps).await?;
            return Ok((updated, Outcome::Updated));
        }

        let NewSetRecord {
            exercise_id,
            session_date,
            set_index,
            weight,
            reps,
            ..
        } = new;
        match self.sets.append(new).await {
            Ok(record) => Ok((record, Outcome::Created)),
            Err(StorageError::Conflict) => {
                debug!(%exercise_id, set_index, "slot taken concurrently, correcting it");
                let existing = self
                    .sets
                    .find_by_index(exercise_id, session_date, set_index)
                    .await?;
                let updated = self.sets.update(existing.id(), weight, reps).await?;
                Ok((updated, Outcome::Updated))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Correct the weight and reps of a logged set.
    ///
    /// An omitted weight keeps the stored one.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden`, `InvalidInput`, or `Storage`, as for registration.
    pub async fn update_set(
        &self,
        user_id: UserId,
        record_id: SetRecordId,
        report: SetReport,
    ) -> Result<SetRecord, ProgressError> {
        let record = self.sets.get(record_id).await?;
        self.owned_exercise(user_id, record.exercise_id()).await?;

        let valid = report.validate(self.settings.max_weight())?;
        let weight = valid.weight.unwrap_or(record.weight());
        let updated = self.sets.update(record_id, weight, valid.reps).await?;
        info!(%user_id, %record_id, "set corrected");
        Ok(updated)
    }

    //
    // ─── QUERIES ───────────────────────────────────────────────────────────────
    //

    /// Every set logged for the exercise, oldest session first.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden`, or `Storage`.
    pub async fn exercise_progress(
        &self,
        user_id: UserId,
        exercise_id: ExerciseId,
    ) -> Result<Vec<SetRecord>, ProgressError> {
        self.owned_exercise(user_id, exercise_id).await?;
        Ok(self
            .sets
            .list_by_exercise(exercise_id, SetOrder::SetIndexAsc)
            .await?)
    }

    /// Status of the exercise in the current session.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden`, or `Storage`.
    pub async fn session_status(
        &self,
        user_id: UserId,
        exercise_id: ExerciseId,
    ) -> Result<SessionStatus, ProgressError> {
        self.session_status_at(user_id, exercise_id, self.clock.now())
            .await
    }

    /// Status of the exercise in the session containing `now`.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden`, or `Storage`.
    pub async fn session_status_at(
        &self,
        user_id: UserId,
        exercise_id: ExerciseId,
        now: DateTime<Utc>,
    ) -> Result<SessionStatus, ProgressError> {
        let (_, exercise) = self.owned_exercise(user_id, exercise_id).await?;
        let session_date = self.settings.session_window().session_date(now);
        let session = self.sets.list_session(exercise_id, session_date).await?;
        Ok(session_status(&exercise, &session))
    }

    /// Weight to pre-fill for the next set: the latest logged weight from any
    /// session, else the exercise target, else zero.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden`, or `Storage`.
    pub async fn last_weight(
        &self,
        user_id: UserId,
        exercise_id: ExerciseId,
    ) -> Result<f64, ProgressError> {
        let (_, exercise) = self.owned_exercise(user_id, exercise_id).await?;
        let last = self.sets.most_recent(exercise_id, None).await?;
        Ok(last
            .map(|record| record.weight())
            .or(exercise.target_weight())
            .unwrap_or(0.0))
    }

    /// All sets across the user's workouts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if repository access fails.
    pub async fn user_history(&self, user_id: UserId) -> Result<Vec<HistoryEntry>, ProgressError> {
        let mut entries = Vec::new();
        for workout in self.workouts.list_workouts(user_id).await? {
            for exercise in self.exercises.list_exercises(workout.id()).await? {
                let sets = self
                    .sets
                    .list_by_exercise(exercise.id(), SetOrder::CompletedAtDesc)
                    .await?;
                entries.extend(sets.into_iter().map(|set| HistoryEntry {
                    workout_id: workout.id(),
                    workout_name: workout.name().to_string(),
                    exercise_id: exercise.id(),
                    exercise_name: exercise.name().to_string(),
                    set,
                }));
            }
        }
        entries.sort_by(|a, b| {
            b.completed_at()
                .cmp(&a.completed_at())
                .then_with(|| b.set.id().cmp(&a.set.id()))
        });
        Ok(entries)
    }

    async fn owned_exercise(
        &self,
        user_id: UserId,
        exercise_id: ExerciseId,
    ) -> Result<(Workout, Exercise), ProgressError> {
        let exercise = self
            .exercises
            .get_exercise(exercise_id)
            .await?
            .ok_or(ProgressError::NotFound)?;
        let workout = self
            .workouts
            .get_workout(exercise.workout_id())
            .await?
            .ok_or(ProgressError::NotFound)?;
        if !workout.is_owned_by(user_id) {
            warn!(%user_id, %exercise_id, "exercise belongs to another user");
            return Err(ProgressError::Forbidden);
        }
        Ok((workout, exercise))
    }
}

/// Weight for a report that omitted it: latest set this session, else the
/// exercise target, else zero.
fn resolve_weight(exercise: &Exercise, session: &[SetRecord]) -> f64 {
    session
        .iter()
        .max_by(|a, b| {
            a.completed_at()
                .cmp(&b.completed_at())
                .then_with(|| a.id().cmp(&b.id()))
        })
        .map(SetRecord::weight)
        .or(exercise.target_weight())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Weekday};
    use lift_core::model::ExerciseDraft;
    use lift_core::time::{fixed_clock, fixed_now};
    use storage::repository::NewWorkoutRecord;

    async fn setup(draft: ExerciseDraft) -> (ProgressService, Storage, Exercise) {
        let storage = Storage::in_memory();
        let workout = storage
            .workouts
            .insert_workout(NewWorkoutRecord {
                user_id: UserId::new(1),
                name: "Legs".into(),
                day: Weekday::Wed,
                created_at: fixed_now(),
            })
            .await
            .unwrap();
        let exercise = storage
            .exercises
            .insert_exercise(workout.id(), draft)
            .await
            .unwrap();
        (
            ProgressService::from_storage(fixed_clock(), &storage),
            storage,
            exercise,
        )
    }

    #[tokio::test]
    async fn occupied_slot_in_session_is_corrected() {
        let (service, storage, ex) = setup(ExerciseDraft::new("Squat", 3, 5)).await;
        let now = fixed_now();
        let first = storage
            .sets
            .append(NewSetRecord {
                exercise_id: ex.id(),
                session_date: now.date_naive(),
                set_index: 1,
                weight: 60.0,
                reps: 5,
                completed_at: now,
            })
            .await
            .unwrap();

        let (record, outcome) = service
            .persist_at_index(
                std::slice::from_ref(&first),
                NewSetRecord {
                    exercise_id: ex.id(),
                    session_date: now.date_naive(),
                    set_index: 1,
                    weight: 62.5,
                    reps: 4,
                    completed_at: now + Duration::seconds(30),
                },
            )
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Updated);
        assert_eq!(record.id(), first.id());
        assert_eq!(record.weight(), 62.5);
        assert_eq!(record.reps(), 4);
        assert_eq!(record.completed_at(), now);
    }

    #[test]
    fn bare_report_prefers_latest_session_weight() {
        let ex = Exercise::from_draft(
            ExerciseId::new(1),
            lift_core::model::WorkoutId::new(1),
            ExerciseDraft::new("Row", 3, 10).with_target_weight(20.0),
        )
        .unwrap();
        assert_eq!(resolve_weight(&ex, &[]), 20.0);

        let now = fixed_now();
        let logged = |index: u32, weight: f64, at: DateTime<Utc>| {
            NewSetRecord {
                exercise_id: ex.id(),
                session_date: now.date_naive(),
                set_index: index,
                weight,
                reps: 10,
                completed_at: at,
            }
            .into_record(SetRecordId::new(u64::from(index)))
            .unwrap()
        };
        let session = vec![
            logged(1, 22.5, now),
            logged(2, 25.0, now + Duration::minutes(2)),
        ];
        assert_eq!(resolve_weight(&ex, &session), 25.0);

        let untargeted = Exercise::from_draft(
            ExerciseId::new(2),
            lift_core::model::WorkoutId::new(1),
            ExerciseDraft::new("Plank", 3, 1),
        )
        .unwrap();
        assert_eq!(resolve_weight(&untargeted, &[]), 0.0);
    }

    #[tokio::test]
    async fn status_query_reads_current_session() {
        let (service, _storage, ex) = setup(ExerciseDraft::new("Squat", 2, 5)).await;
        let t0 = fixed_now();
        service
            .register_set_at(UserId::new(1), ex.id(), SetReport::new(80.0, 5), t0)
            .await
            .unwrap();

        let status = service
            .session_status_at(UserId::new(1), ex.id(), t0 + Duration::minutes(1))
            .await
            .unwrap();
        assert_eq!(status.completed_sets, 1);
        assert_eq!(status.remaining_sets(), 1);

        let tomorrow = service
            .session_status_at(UserId::new(1), ex.id(), t0 + Duration::days(1))
            .await
            .unwrap();
        assert_eq!(tomorrow.completed_sets, 0);
        assert_eq!(tomorrow.next_set_index, 1);
    }
}
