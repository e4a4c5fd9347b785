use chrono::Weekday;
use lift_core::model::{UserId, Workout, WorkoutId};

use super::SqliteRepository;
use super::mapping::{id_i64, map_workout_row, read_err, weekday_to_i64, write_err};
use crate::repository::{NewWorkoutRecord, StorageError, WorkoutRepository};

#[async_trait::async_trait]
impl WorkoutRepository for SqliteRepository {
    async fn insert_workout(&self, workout: NewWorkoutRecord) -> Result<Workout, StorageError> {
        let user_id = id_i64("user_id", workout.user_id.value())?;
        let res = sqlx::query(
            r"
            INSERT INTO workouts (user_id, name, day, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(user_id)
        .bind(&workout.name)
        .bind(weekday_to_i64(workout.day))
        .bind(workout.created_at)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        let id = u64::try_from(res.last_insert_rowid())
            .map_err(|_| StorageError::Serialization("workout id sign overflow".into()))?;
        Workout::from_persisted(
            WorkoutId::new(id),
            workout.user_id,
            workout.name,
            workout.day,
            workout.created_at,
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))
    }

    async fn get_workout(&self, id: WorkoutId) -> Result<Option<Workout>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, name, day, created_at
            FROM workouts WHERE id = ?1
            ",
        )
        .bind(id_i64("workout_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(read_err)?;

        row.as_ref().map(map_workout_row).transpose()
    }

    async fn list_workouts(&self, user_id: UserId) -> Result<Vec<Workout>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, name, day, created_at
            FROM workouts
            WHERE user_id = ?1
            ORDER BY id ASC
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(read_err)?;

        rows.iter().map(map_workout_row).collect()
    }

    async fn workouts_for_day(
        &self,
        user_id: UserId,
        day: Weekday,
    ) -> Result<Vec<Workout>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, name, day, created_at
            FROM workouts
            WHERE user_id = ?1 AND day = ?2
            ORDER BY id ASC
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .bind(weekday_to_i64(day))
        .fetch_all(&self.pool)
        .await
        .map_err(read_err)?;

        rows.iter().map(map_workout_row).collect()
    }

    async fn delete_workout(&self, id: WorkoutId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM workouts WHERE id = ?1")
            .bind(id_i64("workout_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(write_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
