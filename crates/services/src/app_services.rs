use std::sync::Arc;

use progress_core::analytics::AnalyticsSettings;
use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::insights_service::InsightsService;
use crate::progress_service::ProgressService;

/// Assembles the write and read services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    progress: Arc<ProgressService>,
    insights: Arc<InsightsService>,
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
        settings: AnalyticsSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, settings))
    }

    /// Build services over any storage backend.
    ///
    /// Writers built from clones of one `Storage` share its per-key locks.
    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, settings: AnalyticsSettings) -> Self {
        let progress = Arc::new(
            ProgressService::new(clock, Arc::clone(&storage.progress))
                .with_write_locks(Arc::clone(&storage.write_locks)),
        );
        let insights = Arc::new(
            InsightsService::new(clock, Arc::clone(&storage.progress)).with_settings(settings),
        );
        Self { progress, insights }
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn insights(&self) -> Arc<InsightsService> {
        Arc::clone(&self.insights)
    }
}
