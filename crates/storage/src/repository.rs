use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc, Weekday};
use lift_core::model::{
    Exercise, ExerciseDraft, ExerciseId, NewSetRecord, SetRecord, SetRecordId, UserId, Workout,
    WorkoutId,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Values for a workout that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewWorkoutRecord {
    pub user_id: UserId,
    pub name: String,
    pub day: Weekday,
    pub created_at: DateTime<Utc>,
}

/// Ordering for [`SetLogStore::list_by_exercise`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SetOrder {
    /// Oldest session first, then by set index within a session.
    #[default]
    SetIndexAsc,
    /// Newest `completed_at` first; ties broken by the larger id.
    CompletedAtDesc,
}

/// Repository contract for workouts.
#[async_trait]
pub trait WorkoutRepository: Send + Sync {
    /// Persist a new workout and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the workout cannot be stored.
    async fn insert_workout(&self, workout: NewWorkoutRecord) -> Result<Workout, StorageError>;

    /// Fetch a workout by ID, `None` if missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_workout(&self, id: WorkoutId) -> Result<Option<Workout>, StorageError>;

    /// All workouts of a user, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_workouts(&self, user_id: UserId) -> Result<Vec<Workout>, StorageError>;

    /// Workouts of a user scheduled on `day`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn workouts_for_day(
        &self,
        user_id: UserId,
        day: Weekday,
    ) -> Result<Vec<Workout>, StorageError>;

    /// Delete a workout together with its exercises and their set logs.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the workout does not exist.
    async fn delete_workout(&self, id: WorkoutId) -> Result<(), StorageError>;
}

/// Repository contract for exercises.
#[async_trait]
pub trait ExerciseRepository: Send + Sync {
    /// Persist a new exercise under `workout_id`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the workout is missing.
    async fn insert_exercise(
        &self,
        workout_id: WorkoutId,
        draft: ExerciseDraft,
    ) -> Result<Exercise, StorageError>;

    /// Fetch an exercise by ID, `None` if missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_exercise(&self, id: ExerciseId) -> Result<Option<Exercise>, StorageError>;

    /// Exercises of a workout in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_exercises(&self, workout_id: WorkoutId) -> Result<Vec<Exercise>, StorageError>;

    /// Overwrite the mutable fields of an existing exercise.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the exercise does not exist.
    async fn update_exercise(&self, exercise: &Exercise) -> Result<(), StorageError>;

    /// Delete an exercise and its set log.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the exercise does not exist.
    async fn delete_exercise(&self, id: ExerciseId) -> Result<(), StorageError>;
}

/// Append-only log of sets, keyed by exercise.
///
/// Implementations must reject a second record for the same
/// `(exercise_id, session_date, set_index)` with `StorageError::Conflict`, atomically
/// with the insert.
#[async_trait]
pub trait SetLogStore: Send + Sync {
    /// Store a new set and assign it a fresh id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the index is taken for that session.
    async fn append(&self, record: NewSetRecord) -> Result<SetRecord, StorageError>;

    /// Overwrite weight and reps of an existing set.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the record does not exist.
    async fn update(
        &self,
        id: SetRecordId,
        weight: f64,
        reps: u32,
    ) -> Result<SetRecord, StorageError>;

    /// Fetch a set by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the record does not exist.
    async fn get(&self, id: SetRecordId) -> Result<SetRecord, StorageError>;

    /// Every set ever logged for the exercise.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_by_exercise(
        &self,
        exercise_id: ExerciseId,
        order: SetOrder,
    ) -> Result<Vec<SetRecord>, StorageError>;

    /// Sets of one session, ordered by set index.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_session(
        &self,
        exercise_id: ExerciseId,
        session_date: NaiveDate,
    ) -> Result<Vec<SetRecord>, StorageError>;

    /// The set at `set_index` in the given session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if there is none.
    async fn find_by_index(
        &self,
        exercise_id: ExerciseId,
        session_date: NaiveDate,
        set_index: u32,
    ) -> Result<SetRecord, StorageError>;

    /// Latest set by `completed_at`, optionally only those at or after `since`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn most_recent(
        &self,
        exercise_id: ExerciseId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Option<SetRecord>, StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

#[derive(Default)]
struct MemoryState {
    workouts: BTreeMap<WorkoutId, Workout>,
    exercises: BTreeMap<ExerciseId, Exercise>,
    sets: BTreeMap<SetRecordId, SetRecord>,
    last_ids: HashMap<&'static str, u64>,
}

impl MemoryState {
    fn next_id(&mut self, table: &'static str) -> u64 {
        let next = self.last_ids.entry(table).or_insert(0);
        *next += 1;
        *next
    }

    fn drop_exercise(&mut self, id: ExerciseId) {
        self.exercises.remove(&id);
        self.sets.retain(|_, set| set.exercise_id() != id);
    }
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// One mutex guards all tables, so the set-index uniqueness check and the insert
/// happen atomically.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl WorkoutRepository for InMemoryRepository {
    async fn insert_workout(&self, workout: NewWorkoutRecord) -> Result<Workout, StorageError> {
        let mut guard = self.lock()?;
        let id = WorkoutId::new(guard.next_id("workouts"));
        let stored = Workout::from_persisted(
            id,
            workout.user_id,
            workout.name,
            workout.day,
            workout.created_at,
        )
        .map_err(ser)?;
        guard.workouts.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_workout(&self, id: WorkoutId) -> Result<Option<Workout>, StorageError> {
        Ok(self.lock()?.workouts.get(&id).cloned())
    }

    async fn list_workouts(&self, user_id: UserId) -> Result<Vec<Workout>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .workouts
            .values()
            .filter(|w| w.is_owned_by(user_id))
            .cloned()
            .collect())
    }

    async fn workouts_for_day(
        &self,
        user_id: UserId,
        day: Weekday,
    ) -> Result<Vec<Workout>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .workouts
            .values()
            .filter(|w| w.is_owned_by(user_id) && w.day() == day)
            .cloned()
            .collect())
    }

    async fn delete_workout(&self, id: WorkoutId) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard.workouts.remove(&id).ok_or(StorageError::NotFound)?;
        let owned: Vec<ExerciseId> = guard
            .exercises
            .values()
            .filter(|e| e.workout_id() == id)
            .map(Exercise::id)
            .collect();
        for exercise_id in owned {
            guard.drop_exercise(exercise_id);
        }
        Ok(())
    }
}

#[async_trait]
impl ExerciseRepository for InMemoryRepository {
    async fn insert_exercise(
        &self,
        workout_id: WorkoutId,
        draft: ExerciseDraft,
    ) -> Result<Exercise, StorageError> {
        let mut guard = self.lock()?;
        if !guard.workouts.contains_key(&workout_id) {
            return Err(StorageError::NotFound);
        }
        let id = ExerciseId::new(guard.next_id("exercises"));
        let exercise = Exercise::from_draft(id, workout_id, draft).map_err(ser)?;
        guard.exercises.insert(id, exercise.clone());
        Ok(exercise)
    }

    async fn get_exercise(&self, id: ExerciseId) -> Result<Option<Exercise>, StorageError> {
        Ok(self.lock()?.exercises.get(&id).cloned())
    }

    async fn list_exercises(&self, workout_id: WorkoutId) -> Result<Vec<Exercise>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .exercises
            .values()
            .filter(|e| e.workout_id() == workout_id)
            .cloned()
            .collect())
    }

    async fn update_exercise(&self, exercise: &Exercise) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let slot = guard
            .exercises
            .get_mut(&exercise.id())
            .ok_or(StorageError::NotFound)?;
        *slot = exercise.clone();
        Ok(())
    }

    async fn delete_exercise(&self, id: ExerciseId) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if !guard.exercises.contains_key(&id) {
            return Err(StorageError::NotFound);
        }
        guard.drop_exercise(id);
        Ok(())
    }
}

#[async_trait]
impl SetLogStore for InMemoryRepository {
    async fn append(&self, record: NewSetRecord) -> Result<SetRecord, StorageError> {
        let mut guard = self.lock()?;
        let occupied = guard.sets.values().any(|set| {
            set.exercise_id() == record.exercise_id
                && set.session_date() == record.session_date
                && set.set_index() == record.set_index
        });
        if occupied {
            tracing::debug!(
                exercise_id = %record.exercise_id,
                set_index = record.set_index,
                "set index already taken for session"
            );
            return Err(StorageError::Conflict);
        }
        let id = SetRecordId::new(guard.next_id("sets"));
        let stored = record.into_record(id).map_err(ser)?;
        guard.sets.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update(
        &self,
        id: SetRecordId,
        weight: f64,
        reps: u32,
    ) -> Result<SetRecord, StorageError> {
        let mut guard = self.lock()?;
        let set = guard.sets.get_mut(&id).ok_or(StorageError::NotFound)?;
        set.apply_correction(weight, reps).map_err(ser)?;
        Ok(set.clone())
    }

    async fn get(&self, id: SetRecordId) -> Result<SetRecord, StorageError> {
        self.lock()?
            .sets
            .get(&id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_by_exercise(
        &self,
        exercise_id: ExerciseId,
        order: SetOrder,
    ) -> Result<Vec<SetRecord>, StorageError> {
        let guard = self.lock()?;
        let mut out: Vec<SetRecord> = guard
            .sets
            .values()
            .filter(|set| set.exercise_id() == exercise_id)
            .cloned()
            .collect();
        match order {
            SetOrder::SetIndexAsc => {
                out.sort_by_key(|set| (set.session_date(), set.set_index()));
            }
            SetOrder::CompletedAtDesc => {
                out.sort_by(|a, b| {
                    b.completed_at()
                        .cmp(&a.completed_at())
                        .then_with(|| b.id().cmp(&a.id()))
                });
            }
        }
        Ok(out)
    }

    async fn list_session(
        &self,
        exercise_id: ExerciseId,
        session_date: NaiveDate,
    ) -> Result<Vec<SetRecord>, StorageError> {
        let guard = self.lock()?;
        let mut out: Vec<SetRecord> = guard
            .sets
            .values()
            .filter(|set| set.exercise_id() == exercise_id && set.session_date() == session_date)
            .cloned()
            .collect();
        out.sort_by_key(SetRecord::set_index);
        Ok(out)
    }

    async fn find_by_index(
        &self,
        exercise_id: ExerciseId,
        session_date: NaiveDate,
        set_index: u32,
    ) -> Result<SetRecord, StorageError> {
        let guard = self.lock()?;
        guard
            .sets
            .values()
            .find(|set| {
                set.exercise_id() == exercise_id
                    && set.session_date() == session_date
                    && set.set_index() == set_index
            })
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn most_recent(
        &self,
        exercise_id: ExerciseId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Option<SetRecord>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .sets
            .values()
            .filter(|set| set.exercise_id() == exercise_id)
            .filter(|set| since.is_none_or(|since| set.completed_at() >= since))
            .max_by(|a, b| {
                a.completed_at()
                    .cmp(&b.completed_at())
                    .then_with(|| a.id().cmp(&b.id()))
            })
            .cloned())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub workouts: Arc<dyn WorkoutRepository>,
    pub exercises: Arc<dyn ExerciseRepository>,
    pub sets: Arc<dyn SetLogStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let workouts: Arc<dyn WorkoutRepository> = Arc::new(repo.clone());
        let exercises: Arc<dyn ExerciseRepository> = Arc::new(repo.clone());
        let sets: Arc<dyn SetLogStore> = Arc::new(repo);
        Self {
            workouts,
            exercises,
            sets,
        }
    }
}
