use std::sync::Arc;

use lift_core::ProgressSettings;
use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::progress::ProgressService;
use crate::workout_service::WorkoutService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    progress: Arc<ProgressService>,
    workouts: Arc<WorkoutService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        settings: ProgressSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, settings))
    }

    /// Build services over in-memory storage.
    #[must_use]
    pub fn in_memory(clock: Clock, settings: ProgressSettings) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, settings)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, settings: ProgressSettings) -> Self {
        let workouts = Arc::new(WorkoutService::from_storage(clock, storage).with_settings(&settings));
        let progress = Arc::new(ProgressService::from_storage(clock, storage).with_settings(settings));
        Self { progress, workouts }
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn workouts(&self) -> Arc<WorkoutService> {
        Arc::clone(&self.workouts)
    }
}
