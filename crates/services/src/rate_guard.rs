use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use lift_core::model::ExerciseId;
use storage::repository::{SetLogStore, StorageError};

/// Result of a rate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Rejected { retry_after: Duration },
}

impl Admission {
    #[must_use]
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted)
    }
}

/// Per-exercise minimum spacing between submissions.
///
/// The previous submission is the most recent record in the set log, so the guard
/// keeps no counters of its own and survives restarts.
#[derive(Clone)]
pub struct RateGuard {
    sets: Arc<dyn SetLogStore>,
    min_interval: Duration,
}

impl RateGuard {
    #[must_use]
    pub fn new(sets: Arc<dyn SetLogStore>, min_interval: Duration) -> Self {
        Self { sets, min_interval }
    }

    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// `true` if a submission for `exercise_id` at `now` may proceed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the set log cannot be read.
    pub async fn admit(
        &self,
        exercise_id: ExerciseId,
        now: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        Ok(self.check(exercise_id, now).await?.is_admitted())
    }

    /// Like [`RateGuard::admit`], but reports how long to wait when rejected.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the set log cannot be read.
    pub async fn check(
        &self,
        exercise_id: ExerciseId,
        now: DateTime<Utc>,
    ) -> Result<Admission, StorageError> {
        if self.min_interval <= Duration::zero() {
            return Ok(Admission::Admitted);
        }
        let since = now - self.min_interval;
        let Some(last) = self.sets.most_recent(exercise_id, Some(since)).await? else {
            return Ok(Admission::Admitted);
        };

        let elapsed = now - last.completed_at();
        if elapsed >= self.min_interval {
            return Ok(Admission::Admitted);
        }
        Ok(Admission::Rejected {
            retry_after: self.min_interval - elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lift_core::model::NewSetRecord;
    use lift_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    async fn logged_at(repo: &InMemoryRepository, at: DateTime<Utc>, index: u32) {
        repo.append(NewSetRecord {
            exercise_id: ExerciseId::new(1),
            session_date: at.date_naive(),
            set_index: index,
            weight: 50.0,
            reps: 5,
            completed_at: at,
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn rejects_submissions_inside_interval() {
        let repo = InMemoryRepository::new();
        let guard = RateGuard::new(Arc::new(repo.clone()), Duration::seconds(1));
        let t0 = fixed_now();

        assert!(guard.admit(ExerciseId::new(1), t0).await.unwrap());
        logged_at(&repo, t0, 1).await;

        let soon = t0 + Duration::milliseconds(400);
        assert_eq!(
            guard.check(ExerciseId::new(1), soon).await.unwrap(),
            Admission::Rejected {
                retry_after: Duration::milliseconds(600)
            }
        );
        assert!(
            guard
                .admit(ExerciseId::new(1), t0 + Duration::seconds(1))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn intervals_are_per_exercise() {
        let repo = InMemoryRepository::new();
        let guard = RateGuard::new(Arc::new(repo.clone()), Duration::seconds(1));
        let t0 = fixed_now();
        logged_at(&repo, t0, 1).await;

        assert!(guard.admit(ExerciseId::new(2), t0).await.unwrap());
        assert!(!guard.admit(ExerciseId::new(1), t0).await.unwrap());
    }

    #[tokio::test]
    async fn zero_interval_disables_the_guard() {
        let repo = InMemoryRepository::new();
        let guard = RateGuard::new(Arc::new(repo.clone()), Duration::zero());
        logged_at(&repo, fixed_now(), 1).await;
        assert!(guard.admit(ExerciseId::new(1), fixed_now()).await.unwrap());
    }
}
