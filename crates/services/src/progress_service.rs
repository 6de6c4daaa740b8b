use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use progress_core::{
    analytics::{Attempt, record_attempt},
    model::{AttemptSource, ProgressKey, TopicProgress},
    time::Clock,
};
use storage::locks::KeyLocks;
use storage::repository::{ProgressRepository, StorageError};

use crate::error::ProgressServiceError;

/// Revision conflicts tolerated before a write gives up.
const MAX_WRITE_ATTEMPTS: usize = 16;

/// Outcome of recording one attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedAttempt {
    pub progress: TopicProgress,
    /// True when this attempt created the record.
    pub created: bool,
}

/// Write path for progress records.
///
/// Each call runs fetch, update and upsert under a lock scoped to the record
/// key. Services sharing one lock table never race; writers outside it (other
/// processes on the same database) are caught by the revision check and the
/// attempt is re-applied to the fresh record.
pub struct ProgressService {
    clock: Clock,
    progress: Arc<dyn ProgressRepository>,
    locks: Arc<KeyLocks>,
}

impl ProgressService {
    #[must_use]
    pub fn new(clock: Clock, progress: Arc<dyn ProgressRepository>) -> Self {
        Self {
            clock,
            progress,
            locks: Arc::new(KeyLocks::default()),
        }
    }

    /// Share a lock table with other writers over the same repository.
    #[must_use]
    pub fn with_write_locks(mut self, locks: Arc<KeyLocks>) -> Self {
        self.locks = locks;
        self
    }

    /// Current time according to the service's clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Apply an attempt to the record for `key`, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Progress` if a new record cannot be
    /// built (blank topic) and `ProgressServiceError::Storage` if the record
    /// cannot be loaded or stored, including `StorageError::Conflict` once
    /// every retry lost to another writer. Nothing is written on error.
    pub async fn record_attempt(
        &self,
        key: ProgressKey,
        attempt: &Attempt,
    ) -> Result<RecordedAttempt, ProgressServiceError> {
        let _guard = self.locks.acquire(&key).await;
        // Read the clock once, after the lock, so timestamps stay ordered per key.
        let now = self.now();

        let mut tries = 0;
        loop {
            tries += 1;
            match self.apply_once(&key, attempt, now).await {
                Err(ProgressServiceError::Storage(StorageError::Conflict { .. }))
                    if tries < MAX_WRITE_ATTEMPTS =>
                {
                    debug!(%key, tries, "progress changed underneath, retrying");
                }
                result => return result,
            }
        }
    }

    async fn apply_once(
        &self,
        key: &ProgressKey,
        attempt: &Attempt,
        now: DateTime<Utc>,
    ) -> Result<RecordedAttempt, ProgressServiceError> {
        let existing = self.progress.get_progress(key).await.inspect_err(|err| {
            warn!(%key, error = %err, "failed to load progress");
        })?;
        let created = existing.is_none();
        let mut progress = match existing {
            Some(progress) => progress,
            None => TopicProgress::new(
                key.clone(),
                attempt.difficulty.unwrap_or_default(),
                attempt.source.unwrap_or(AttemptSource::Practice),
                now,
            )?,
        };

        record_attempt(&mut progress, attempt, now);

        let revision = self
            .progress
            .upsert_progress(&progress)
            .await
            .inspect_err(|err| {
                if !matches!(err, StorageError::Conflict { .. }) {
                    warn!(key = %progress.key(), error = %err, "failed to store progress");
                }
            })?;
        let progress = progress.with_revision(revision);

        if created {
            info!(key = %progress.key(), "created progress record");
        }
        debug!(
            key = %progress.key(),
            revision,
            total = progress.total_questions(),
            correct = progress.correct_answers(),
            accuracy = progress.accuracy(),
            streak = progress.streak().current,
            confidence = progress.confidence(),
            "recorded attempt"
        );

        Ok(RecordedAttempt { progress, created })
    }

    /// Fetch a single record.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` on repository failures.
    pub async fn get(
        &self,
        key: &ProgressKey,
    ) -> Result<Option<TopicProgress>, ProgressServiceError> {
        Ok(self.progress.get_progress(key).await?)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
