use chrono::{DateTime, NaiveDate, Utc};
use lift_core::model::{ExerciseId, NewSetRecord, SetRecord, SetRecordId};

use super::SqliteRepository;
use super::mapping::{id_i64, map_set_row, read_err, ser, write_err};
use crate::repository::{SetLogStore, SetOrder, StorageError};

const SET_COLUMNS: &str =
    "id, exercise_id, session_date, set_index, weight, reps, completed_at";

#[async_trait::async_trait]
impl SetLogStore for SqliteRepository {
    async fn append(&self, record: NewSetRecord) -> Result<SetRecord, StorageError> {
        // Validate before touching the table; the id is replaced below.
        record
            .clone()
            .into_record(SetRecordId::new(0))
            .map_err(ser)?;

        let res = sqlx::query(
            r"
            INSERT INTO set_records (exercise_id, session_date, set_index, weight, reps, completed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(id_i64("exercise_id", record.exercise_id.value())?)
        .bind(record.session_date)
        .bind(i64::from(record.set_index))
        .bind(record.weight)
        .bind(i64::from(record.reps))
        .bind(record.completed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let err = write_err(e);
            if matches!(err, StorageError::Conflict) {
                tracing::debug!(
                    exercise_id = %record.exercise_id,
                    set_index = record.set_index,
                    "set index already taken for session"
                );
            }
            err
        })?;

        let id = u64::try_from(res.last_insert_rowid())
            .map_err(|_| StorageError::Serialization("set id sign overflow".into()))?;
        record.into_record(SetRecordId::new(id)).map_err(ser)
    }

    async fn update(
        &self,
        id: SetRecordId,
        weight: f64,
        reps: u32,
    ) -> Result<SetRecord, StorageError> {
        let mut current = self.get(id).await?;
        current.apply_correction(weight, reps).map_err(ser)?;

        let res = sqlx::query("UPDATE set_records SET weight = ?2, reps = ?3 WHERE id = ?1")
            .bind(id_i64("set_id", id.value())?)
            .bind(current.weight())
            .bind(i64::from(current.reps()))
            .execute(&self.pool)
            .await
            .map_err(write_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(current)
    }

    async fn get(&self, id: SetRecordId) -> Result<SetRecord, StorageError> {
        let sql = format!("SELECT {SET_COLUMNS} FROM set_records WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id_i64("set_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(read_err)?
            .ok_or(StorageError::NotFound)?;

        map_set_row(&row)
    }

    async fn list_by_exercise(
        &self,
        exercise_id: ExerciseId,
        order: SetOrder,
    ) -> Result<Vec<SetRecord>, StorageError> {
        let order_by = match order {
            SetOrder::SetIndexAsc => "session_date ASC, set_index ASC",
            SetOrder::CompletedAtDesc => "completed_at DESC, id DESC",
        };
        let sql = format!(
            "SELECT {SET_COLUMNS} FROM set_records WHERE exercise_id = ?1 ORDER BY {order_by}"
        );
        let rows = sqlx::query(&sql)
            .bind(id_i64("exercise_id", exercise_id.value())?)
            .fetch_all(&self.pool)
            .await
            .map_err(read_err)?;

        rows.iter().map(map_set_row).collect()
    }

    async fn list_session(
        &self,
        exercise_id: ExerciseId,
        session_date: NaiveDate,
    ) -> Result<Vec<SetRecord>, StorageError> {
        let sql = format!(
            "SELECT {SET_COLUMNS} FROM set_records \
             WHERE exercise_id = ?1 AND session_date = ?2 \
             ORDER BY set_index ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(id_i64("exercise_id", exercise_id.value())?)
            .bind(session_date)
            .fetch_all(&self.pool)
            .await
            .map_err(read_err)?;

        rows.iter().map(map_set_row).collect()
    }

    async fn find_by_index(
        &self,
        exercise_id: ExerciseId,
        session_date: NaiveDate,
        set_index: u32,
    ) -> Result<SetRecord, StorageError> {
        let sql = format!(
            "SELECT {SET_COLUMNS} FROM set_records \
             WHERE exercise_id = ?1 AND session_date = ?2 AND set_index = ?3"
        );
        let row = sqlx::query(&sql)
            .bind(id_i64("exercise_id", exercise_id.value())?)
            .bind(session_date)
            .bind(i64::from(set_index))
            .fetch_optional(&self.pool)
            .await
            .map_err(read_err)?
            .ok_or(StorageError::NotFound)?;

        map_set_row(&row)
    }

    async fn most_recent(
        &self,
        exercise_id: ExerciseId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Option<SetRecord>, StorageError> {
        let sql = format!(
            "SELECT {SET_COLUMNS} FROM set_records \
             WHERE exercise_id = ?1 AND (?2 IS NULL OR completed_at >= ?2) \
             ORDER BY completed_at DESC, id DESC \
             LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(id_i64("exercise_id", exercise_id.value())?)
            .bind(since)
            .fetch_optional(&self.pool)
            .await
            .map_err(read_err)?;

        row.as_ref().map(map_set_row).transpose()
    }
}
