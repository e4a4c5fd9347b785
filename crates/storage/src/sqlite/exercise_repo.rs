use lift_core::model::{Exercise, ExerciseDraft, ExerciseId, WorkoutId};

use super::SqliteRepository;
use super::mapping::{id_i64, map_exercise_row, read_err, ser, write_err};
use crate::repository::{ExerciseRepository, StorageError};

#[async_trait::async_trait]
impl ExerciseRepository for SqliteRepository {
    async fn insert_exercise(
        &self,
        workout_id: WorkoutId,
        draft: ExerciseDraft,
    ) -> Result<Exercise, StorageError> {
        let draft = draft.validate().map_err(ser)?;
        let res = sqlx::query(
            r"
            INSERT INTO exercises (workout_id, name, sets, reps, target_weight)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(id_i64("workout_id", workout_id.value())?)
        .bind(&draft.name)
        .bind(i64::from(draft.sets))
        .bind(i64::from(draft.reps))
        .bind(draft.target_weight)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        let id = u64::try_from(res.last_insert_rowid())
            .map_err(|_| StorageError::Serialization("exercise id sign overflow".into()))?;
        Exercise::from_draft(ExerciseId::new(id), workout_id, draft).map_err(ser)
    }

    async fn get_exercise(&self, id: ExerciseId) -> Result<Option<Exercise>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, workout_id, name, sets, reps, target_weight
            FROM exercises WHERE id = ?1
            ",
        )
        .bind(id_i64("exercise_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(read_err)?;

        row.as_ref().map(map_exercise_row).transpose()
    }

    async fn list_exercises(&self, workout_id: WorkoutId) -> Result<Vec<Exercise>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, workout_id, name, sets, reps, target_weight
            FROM exercises
            WHERE workout_id = ?1
            ORDER BY id ASC
            ",
        )
        .bind(id_i64("workout_id", workout_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(read_err)?;

        rows.iter().map(map_exercise_row).collect()
    }

    async fn update_exercise(&self, exercise: &Exercise) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE exercises
            SET name = ?2, sets = ?3, reps = ?4, target_weight = ?5
            WHERE id = ?1
            ",
        )
        .bind(id_i64("exercise_id", exercise.id().value())?)
        .bind(exercise.name())
        .bind(i64::from(exercise.sets()))
        .bind(i64::from(exercise.reps()))
        .bind(exercise.target_weight())
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_exercise(&self, id: ExerciseId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM exercises WHERE id = ?1")
            .bind(id_i64("exercise_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(write_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
