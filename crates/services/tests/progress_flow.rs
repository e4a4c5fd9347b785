use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc, Weekday};
use lift_core::model::{
    Exercise, ExerciseDraft, ExerciseId, ExercisePatch, NewSetRecord, SetRecord, SetRecordId,
    UserId,
};
use lift_core::time::fixed_now;
use services::{
    Clock, Outcome, ProgressError, ProgressService, RegistrationResponse, SetReport,
    WorkoutService,
};
use storage::repository::{
    InMemoryRepository, SetLogStore, SetOrder, Storage, StorageError,
};

const OWNER: UserId = UserId::new(1);

struct Fixture {
    progress: ProgressService,
    workouts: WorkoutService,
}

fn fixture(storage: &Storage) -> Fixture {
    let clock = Clock::fixed(fixed_now());
    Fixture {
        progress: ProgressService::from_storage(clock, storage),
        workouts: WorkoutService::from_storage(clock, storage),
    }
}

async fn exercise(f: &Fixture, draft: ExerciseDraft) -> Exercise {
    let workout = f
        .workouts
        .create_workout(OWNER, "Full body", Weekday::Wed)
        .await
        .expect("create workout");
    f.workouts
        .add_exercise(OWNER, workout.id(), draft)
        .await
        .expect("add exercise")
}

fn at(secs: i64) -> DateTime<Utc> {
    fixed_now() + Duration::seconds(secs)
}

#[tokio::test]
async fn completing_all_sets_suggests_heavier_weight() {
    let f = fixture(&Storage::in_memory());
    let ex = exercise(&f, ExerciseDraft::new("Bench", 3, 8)).await;

    let first = f
        .progress
        .register_set_at(OWNER, ex.id(), SetReport::new(20.0, 8), at(0))
        .await
        .unwrap();
    assert_eq!(first.outcome, Outcome::Created);
    assert_eq!(first.message, "Set 1 of 3 registered");
    assert!(!first.is_completed);
    assert_eq!(first.suggested_weight, None);

    f.progress
        .register_set_at(OWNER, ex.id(), SetReport::new(20.0, 8), at(60))
        .await
        .unwrap();
    let last = f
        .progress
        .register_set_at(OWNER, ex.id(), SetReport::new(20.0, 7), at(120))
        .await
        .unwrap();

    assert!(last.is_completed);
    assert_eq!(last.status.next_set_index, 4);
    assert_eq!(last.record.set_index(), 3);
    assert_eq!(last.suggested_weight, Some(21.25));
    assert_eq!(last.status.suggested_weight, Some(21.25));
    assert_eq!(last.message, "All sets completed! Try 21.25kg next time");
}

#[tokio::test]
async fn unloaded_completion_has_no_suggestion() {
    let f = fixture(&Storage::in_memory());
    let ex = exercise(&f, ExerciseDraft::new("Pull-up", 1, 10)).await;

    let result = f
        .progress
        .register_set_at(OWNER, ex.id(), SetReport::new(0.0, 10), at(0))
        .await
        .unwrap();
    assert!(result.is_completed);
    assert_eq!(result.suggested_weight, None);
    assert_eq!(result.message, "All sets completed!");
}

#[tokio::test]
async fn omitted_weight_falls_back_to_target() {
    let f = fixture(&Storage::in_memory());
    let ex = exercise(
        &f,
        ExerciseDraft::new("Row", 3, 10).with_target_weight(20.0),
    )
    .await;

    let result = f
        .progress
        .register_set_at(OWNER, ex.id(), SetReport::reps_only(10), at(0))
        .await
        .unwrap();
    assert_eq!(result.record.weight(), 20.0);

    f.progress
        .register_set_at(OWNER, ex.id(), SetReport::new(22.5, 10), at(30))
        .await
        .unwrap();
    let third = f
        .progress
        .register_set_at(OWNER, ex.id(), SetReport::reps_only(9), at(60))
        .await
        .unwrap();
    assert_eq!(third.record.weight(), 22.5);
}

#[tokio::test]
async fn rapid_resubmission_is_rate_limited() {
    let storage = Storage::in_memory();
    let f = fixture(&storage);
    let ex = exercise(&f, ExerciseDraft::new("Squat", 5, 5)).await;
    let t0 = fixed_now();

    f.progress
        .register_set_at(OWNER, ex.id(), SetReport::new(100.0, 5), t0)
        .await
        .unwrap();
    let err = f
        .progress
        .register_set_at(
            OWNER,
            ex.id(),
            SetReport::new(100.0, 5),
            t0 + Duration::milliseconds(500),
        )
        .await
        .unwrap_err();
    match err {
        ProgressError::RateLimited { retry_after } => {
            assert_eq!(retry_after, Duration::milliseconds(500));
        }
        other => panic!("expected rate limit, got {other:?}"),
    }

    let logged = storage
        .sets
        .list_by_exercise(ex.id(), SetOrder::SetIndexAsc)
        .await
        .unwrap();
    assert_eq!(logged.len(), 1);

    f.progress
        .register_set_at(
            OWNER,
            ex.id(),
            SetReport::new(100.0, 5),
            t0 + Duration::seconds(1),
        )
        .await
        .expect("interval elapsed");
}

#[tokio::test]
async fn sets_beyond_target_are_extra() {
    let f = fixture(&Storage::in_memory());
    let ex = exercise(&f, ExerciseDraft::new("Curl", 2, 12)).await;

    for (i, secs) in [0, 30].into_iter().enumerate() {
        let r = f
            .progress
            .register_set_at(OWNER, ex.id(), SetReport::new(12.5, 12), at(secs))
            .await
            .unwrap();
        assert_eq!(r.record.set_index(), u32::try_from(i + 1).unwrap());
    }

    let extra = f
        .progress
        .register_set_at(OWNER, ex.id(), SetReport::new(12.5, 10), at(60))
        .await
        .unwrap();
    assert_eq!(extra.outcome, Outcome::Created);
    assert_eq!(extra.record.set_index(), 3);
    assert!(extra.status.is_extra);
    assert!(extra.is_completed);
    assert_eq!(extra.suggested_weight, None);
    assert_eq!(extra.message, "Extra set 1 registered");
}

#[tokio::test]
async fn weight_ceiling_is_inclusive() {
    let storage = Storage::in_memory();
    let f = fixture(&storage);
    let ex = exercise(&f, ExerciseDraft::new("Deadlift", 3, 3)).await;

    let err = f
        .progress
        .register_set_at(OWNER, ex.id(), SetReport::new(500.01, 3), at(0))
        .await
        .unwrap_err();
    assert!(matches!(err, ProgressError::InvalidInput(_)));

    let err = f
        .progress
        .register_set_at(OWNER, ex.id(), SetReport::new(100.0, 0), at(0))
        .await
        .unwrap_err();
    assert!(matches!(err, ProgressError::InvalidInput(_)));

    let ok = f
        .progress
        .register_set_at(OWNER, ex.id(), SetReport::new(500.0, 3), at(0))
        .await
        .unwrap();
    assert_eq!(ok.record.weight(), 500.0);
    assert_eq!(ok.record.set_index(), 1);
}

#[tokio::test]
async fn previous_day_does_not_count_toward_today() {
    let f = fixture(&Storage::in_memory());
    let ex = exercise(&f, ExerciseDraft::new("Press", 3, 5)).await;
    let yesterday = fixed_now() - Duration::days(1);

    for secs in [0, 30] {
        f.progress
            .register_set_at(
                OWNER,
                ex.id(),
                SetReport::new(40.0, 5),
                yesterday + Duration::seconds(secs),
            )
            .await
            .unwrap();
    }

    let today = f
        .progress
        .register_set_at(OWNER, ex.id(), SetReport::reps_only(5), at(0))
        .await
        .unwrap();
    assert_eq!(today.record.set_index(), 1);
    assert_eq!(today.message, "Set 1 of 3 registered");
    assert_eq!(today.status.completed_sets, 1);
    // No record in today's session and no target weight.
    assert_eq!(today.record.weight(), 0.0);

    let weight = f.progress.last_weight(OWNER, ex.id()).await.unwrap();
    assert_eq!(weight, 0.0);
}

#[tokio::test]
async fn ownership_and_existence_are_checked() {
    let f = fixture(&Storage::in_memory());
    let ex = exercise(&f, ExerciseDraft::new("Lunge", 3, 10)).await;

    let err = f
        .progress
        .register_set_at(UserId::new(2), ex.id(), SetReport::new(10.0, 10), at(0))
        .await
        .unwrap_err();
    assert!(matches!(err, ProgressError::Forbidden));

    let err = f
        .progress
        .register_set_at(OWNER, ExerciseId::new(999), SetReport::new(10.0, 10), at(0))
        .await
        .unwrap_err();
    assert!(matches!(err, ProgressError::NotFound));

    let err = f
        .progress
        .update_set(OWNER, SetRecordId::new(999), SetReport::reps_only(5))
        .await
        .unwrap_err();
    assert!(matches!(err, ProgressError::NotFound));
}

/// Hides the current session from reads, as a reader racing another writer would see it.
struct StaleSessionStore {
    inner: InMemoryRepository,
}

#[async_trait]
impl SetLogStore for StaleSessionStore {
    async fn append(&self, record: NewSetRecord) -> Result<SetRecord, StorageError> {
        self.inner.append(record).await
    }

    async fn update(
        &self,
        id: SetRecordId,
        weight: f64,
        reps: u32,
    ) -> Result<SetRecord, StorageError> {
        self.inner.update(id, weight, reps).await
    }

    async fn get(&self, id: SetRecordId) -> Result<SetRecord, StorageError> {
        self.inner.get(id).await
    }

    async fn list_by_exercise(
        &self,
        exercise_id: ExerciseId,
        order: SetOrder,
    ) -> Result<Vec<SetRecord>, StorageError> {
        self.inner.list_by_exercise(exercise_id, order).await
    }

    async fn list_session(
        &self,
        _exercise_id: ExerciseId,
        _session_date: NaiveDate,
    ) -> Result<Vec<SetRecord>, StorageError> {
        Ok(Vec::new())
    }

    async fn find_by_index(
        &self,
        exercise_id: ExerciseId,
        session_date: NaiveDate,
        set_index: u32,
    ) -> Result<SetRecord, StorageError> {
        self.inner
            .find_by_index(exercise_id, session_date, set_index)
            .await
    }

    async fn most_recent(
        &self,
        exercise_id: ExerciseId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Option<SetRecord>, StorageError> {
        self.inner.most_recent(exercise_id, since).await
    }
}

#[tokio::test]
async fn duplicate_slot_keeps_one_record_with_latest_values() {
    let inner = InMemoryRepository::new();
    let storage = Storage {
        workouts: Arc::new(inner.clone()),
        exercises: Arc::new(inner.clone()),
        sets: Arc::new(StaleSessionStore {
            inner: inner.clone(),
        }),
    };
    let f = fixture(&storage);
    let ex = exercise(&f, ExerciseDraft::new("Dip", 3, 10)).await;

    let first = f
        .progress
        .register_set_at(OWNER, ex.id(), SetReport::new(40.0, 8), at(0))
        .await
        .unwrap();
    assert_eq!(first.outcome, Outcome::Created);

    let second = f
        .progress
        .register_set_at(OWNER, ex.id(), SetReport::new(42.5, 6), at(5))
        .await
        .expect("conflict is recovered");
    assert_eq!(second.outcome, Outcome::Updated);
    assert_eq!(second.record.id(), first.record.id());
    assert_eq!(second.message, "Set 1 updated");

    let logged = inner
        .list_by_exercise(ex.id(), SetOrder::SetIndexAsc)
        .await
        .unwrap();
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].weight(), 42.5);
    assert_eq!(logged[0].reps(), 6);
}

#[tokio::test]
async fn editing_target_reopens_session() {
    let f = fixture(&Storage::in_memory());
    let ex = exercise(&f, ExerciseDraft::new("Squat", 3, 5)).await;
    for secs in [0, 30, 60] {
        f.progress
            .register_set_at(OWNER, ex.id(), SetReport::new(60.0, 5), at(secs))
            .await
            .unwrap();
    }
    let done = f
        .progress
        .session_status_at(OWNER, ex.id(), at(90))
        .await
        .unwrap();
    assert!(done.is_completed);

    f.workouts
        .update_exercise(
            OWNER,
            ex.id(),
            ExercisePatch {
                sets: Some(5),
                ..ExercisePatch::default()
            },
        )
        .await
        .unwrap();

    let reopened = f
        .progress
        .session_status_at(OWNER, ex.id(), at(90))
        .await
        .unwrap();
    assert!(!reopened.is_completed);
    assert!(!reopened.is_extra);
    assert_eq!(reopened.next_set_index, 4);
    assert_eq!(reopened.remaining_sets(), 2);
}

#[tokio::test]
async fn corrections_and_history() {
    let f = fixture(&Storage::in_memory());
    let bench = exercise(&f, ExerciseDraft::new("Bench", 3, 8)).await;
    let row = exercise(
        &f,
        ExerciseDraft::new("Row", 3, 8).with_target_weight(30.0),
    )
    .await;

    assert_eq!(f.progress.last_weight(OWNER, row.id()).await.unwrap(), 30.0);
    assert_eq!(f.progress.last_weight(OWNER, bench.id()).await.unwrap(), 0.0);

    let b1 = f
        .progress
        .register_set_at(OWNER, bench.id(), SetReport::new(50.0, 8), at(0))
        .await
        .unwrap();
    f.progress
        .register_set_at(OWNER, row.id(), SetReport::new(32.5, 8), at(10))
        .await
        .unwrap();

    let corrected = f
        .progress
        .update_set(OWNER, b1.record.id(), SetReport::reps_only(6))
        .await
        .unwrap();
    assert_eq!(corrected.weight(), 50.0);
    assert_eq!(corrected.reps(), 6);

    let err = f
        .progress
        .update_set(UserId::new(2), b1.record.id(), SetReport::reps_only(6))
        .await
        .unwrap_err();
    assert!(matches!(err, ProgressError::Forbidden));

    assert_eq!(f.progress.last_weight(OWNER, row.id()).await.unwrap(), 32.5);

    let history = f.progress.user_history(OWNER).await.unwrap();
    let names: Vec<&str> = history.iter().map(|h| h.exercise_name.as_str()).collect();
    assert_eq!(names, vec!["Row", "Bench"]);
    assert!(f.progress.user_history(UserId::new(2)).await.unwrap().is_empty());

    let progress = f.progress.exercise_progress(OWNER, bench.id()).await.unwrap();
    assert_eq!(progress.len(), 1);
    assert_eq!(progress[0].reps(), 6);
}

#[tokio::test]
async fn response_serializes_to_wire_shape() {
    let f = fixture(&Storage::in_memory());
    let ex = exercise(&f, ExerciseDraft::new("Press", 1, 5)).await;
    let result = f
        .progress
        .register_set_at(OWNER, ex.id(), SetReport::new(30.0, 5), at(0))
        .await
        .unwrap();

    let json = serde_json::to_value(RegistrationResponse::from(result)).unwrap();
    assert_eq!(json["isCompleted"], serde_json::json!(true));
    assert_eq!(json["suggestedWeight"], serde_json::json!(31.25));
    assert_eq!(json["progress"]["setIndex"], serde_json::json!(1));
    assert_eq!(json["progress"]["weight"], serde_json::json!(30.0));
    assert!(json["message"].as_str().unwrap().starts_with("All sets completed!"));
}

#[tokio::test]
async fn sqlite_backed_registration_flow() {
    let storage = Storage::sqlite("sqlite:file:memdb_progress_flow?mode=memory&cache=shared")
        .await
        .expect("connect sqlite");
    let f = fixture(&storage);
    let ex = exercise(&f, ExerciseDraft::new("Squat", 2, 5)).await;

    f.progress
        .register_set_at(OWNER, ex.id(), SetReport::new(80.0, 5), at(0))
        .await
        .unwrap();
    let done = f
        .progress
        .register_set_at(OWNER, ex.id(), SetReport::new(80.0, 5), at(90))
        .await
        .unwrap();
    assert!(done.is_completed);
    assert_eq!(done.suggested_weight, Some(81.25));

    let err = f
        .progress
        .register_set_at(
            OWNER,
            ex.id(),
            SetReport::new(80.0, 5),
            at(90) + Duration::milliseconds(100),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ProgressError::RateLimited { .. }));

    let adopted = f
        .workouts
        .adopt_suggested_weight(OWNER, ex.id(), 81.25)
        .await
        .unwrap();
    assert_eq!(adopted.target_weight(), Some(81.25));

    let workout_id = ex.workout_id();
    f.workouts.delete_workout(OWNER, workout_id).await.unwrap();
    assert!(
        storage
            .sets
            .list_by_exercise(ex.id(), SetOrder::SetIndexAsc)
            .await
            .unwrap()
            .is_empty()
    );
}
