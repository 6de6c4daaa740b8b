use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use progress_core::{
    analytics::{
        AggregateReport, AnalyticsSettings, Recommendation, RecommendationRanker,
        SubtopicInsights, classify, summarize,
    },
    model::{ExamType, LearnerId, ProgressKey, TopicProgress},
    time::Clock,
};
use storage::repository::{ProgressFilter, ProgressRepository};

use crate::error::InsightsError;

/// Aggregate statistics and study suggestions from one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub report: AggregateReport,
    pub recommendations: Vec<Recommendation>,
}

/// Read paths over a learner's progress records.
///
/// Every method loads a snapshot and runs the pure analytics on it; nothing
/// here writes.
pub struct InsightsService {
    clock: Clock,
    progress: Arc<dyn ProgressRepository>,
    settings: AnalyticsSettings,
}

impl InsightsService {
    #[must_use]
    pub fn new(clock: Clock, progress: Arc<dyn ProgressRepository>) -> Self {
        Self {
            clock,
            progress,
            settings: AnalyticsSettings::default(),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: AnalyticsSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &AnalyticsSettings {
        &self.settings
    }

    async fn snapshot(
        &self,
        learner_id: LearnerId,
        exam_type: Option<ExamType>,
    ) -> Result<Vec<TopicProgress>, InsightsError> {
        let filter = ProgressFilter::learner(learner_id).with_exam_type(exam_type);
        let records = self.progress.list_progress(&filter).await?;
        debug!(%learner_id, ?exam_type, records = records.len(), "loaded progress snapshot");
        Ok(records)
    }

    fn rank(
        &self,
        records: &[TopicProgress],
        limit: Option<usize>,
        now: DateTime<Utc>,
    ) -> Vec<Recommendation> {
        let limit = limit.unwrap_or(self.settings.recommendation_limit());
        RecommendationRanker::new(&self.settings).rank(records, limit, now)
    }

    /// Overall statistics, optionally for one exam type.
    ///
    /// # Errors
    ///
    /// Returns `InsightsError::Storage` on repository failures.
    pub async fn summary(
        &self,
        learner_id: LearnerId,
        exam_type: Option<ExamType>,
    ) -> Result<AggregateReport, InsightsError> {
        let records = self.snapshot(learner_id, exam_type).await?;
        Ok(summarize(&records, exam_type))
    }

    /// Topics to study next across all exam types.
    ///
    /// `limit` falls back to the configured recommendation limit.
    ///
    /// # Errors
    ///
    /// Returns `InsightsError::Storage` on repository failures.
    pub async fn recommendations(
        &self,
        learner_id: LearnerId,
        limit: Option<usize>,
    ) -> Result<Vec<Recommendation>, InsightsError> {
        let now = self.clock.now();
        let records = self.snapshot(learner_id, None).await?;
        Ok(self.rank(&records, limit, now))
    }

    /// Weak and strong subtopics of one record.
    ///
    /// # Errors
    ///
    /// Returns `InsightsError::UnknownTopic` if no record exists for the key,
    /// or `InsightsError::Storage` on repository failures.
    pub async fn topic_insights(
        &self,
        key: &ProgressKey,
    ) -> Result<SubtopicInsights, InsightsError> {
        let record = self
            .progress
            .get_progress(key)
            .await?
            .ok_or_else(|| InsightsError::UnknownTopic(key.to_string()))?;
        Ok(classify(&record, &self.settings))
    }

    /// Report and recommendations computed from the same snapshot.
    ///
    /// # Errors
    ///
    /// Returns `InsightsError::Storage` on repository failures.
    pub async fn dashboard(
        &self,
        learner_id: LearnerId,
        exam_type: Option<ExamType>,
    ) -> Result<Dashboard, InsightsError> {
        let now = self.clock.now();
        let records = self.snapshot(learner_id, exam_type).await?;
        Ok(Dashboard {
            report: summarize(&records, exam_type),
            recommendations: self.rank(&records, None, now),
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
