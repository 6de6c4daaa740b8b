use async_trait::async_trait;
use progress_core::model::{ExamType, LearnerId, ProgressKey, TopicProgress};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::locks::KeyLocks;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// The stored revision moved past the one the write was based on.
    #[error("conflict: {key} changed since revision {expected}")]
    Conflict { key: ProgressKey, expected: u64 },

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Selects the records of one learner, optionally for one exam type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressFilter {
    pub learner_id: LearnerId,
    pub exam_type: Option<ExamType>,
}

impl ProgressFilter {
    #[must_use]
    pub fn learner(learner_id: LearnerId) -> Self {
        Self {
            learner_id,
            exam_type: None,
        }
    }

    #[must_use]
    pub fn with_exam_type(mut self, exam_type: Option<ExamType>) -> Self {
        self.exam_type = exam_type;
        self
    }

    #[must_use]
    pub fn matches(&self, key: &ProgressKey) -> bool {
        key.learner_id == self.learner_id && self.exam_type.is_none_or(|e| key.exam_type == e)
    }
}

/// Repository contract for topic progress records.
///
/// Implementations keep exactly one record per `ProgressKey`.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch a record by its key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails or the row cannot be decoded.
    async fn get_progress(&self, key: &ProgressKey) -> Result<Option<TopicProgress>, StorageError>;

    /// Fetch every record matching the filter, ordered by topic then exam type.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails or a row cannot be decoded.
    async fn list_progress(
        &self,
        filter: &ProgressFilter,
    ) -> Result<Vec<TopicProgress>, StorageError>;

    /// Store `progress` under its key if the stored revision still equals
    /// `progress.revision()` (a missing record counts as revision `0`).
    ///
    /// Returns the new stored revision.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if another writer stored the record
    /// first, or another `StorageError` if the record cannot be stored.
    async fn upsert_progress(&self, progress: &TopicProgress) -> Result<u64, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    progress: Arc<Mutex<BTreeMap<ProgressKey, TopicProgress>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn get_progress(&self, key: &ProgressKey) -> Result<Option<TopicProgress>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn list_progress(
        &self,
        filter: &ProgressFilter,
    ) -> Result<Vec<TopicProgress>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        // Keys sort by learner, topic, exam type, which is the contract order.
        Ok(guard
            .iter()
            .filter(|(key, _)| filter.matches(key))
            .map(|(_, progress)| progress.clone())
            .collect())
    }

    async fn upsert_progress(&self, progress: &TopicProgress) -> Result<u64, StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let stored = guard.get(progress.key()).map_or(0, TopicProgress::revision);
        if stored != progress.revision() {
            return Err(StorageError::Conflict {
                key: progress.key().clone(),
                expected: progress.revision(),
            });
        }
        let revision = stored.saturating_add(1);
        guard.insert(
            progress.key().clone(),
            progress.clone().with_revision(revision),
        );
        Ok(revision)
    }
}

/// Repositories behind trait objects for easy backend swapping.
///
/// `write_locks` is shared by every clone, so all writers over one backend
/// serialize per record key.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
    pub write_locks: Arc<KeyLocks>,
}

impl Storage {
    #[must_use]
    pub fn new(progress: Arc<dyn ProgressRepository>) -> Self {
        Self {
            progress,
            write_locks: Arc::new(KeyLocks::default()),
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryRepository::new()))
    }
}
