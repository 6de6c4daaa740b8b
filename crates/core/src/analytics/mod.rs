//! The progress analytics engine.
//!
//! The write path is [`record_attempt`]; every other entry point is a pure
//! read over a snapshot of records and may run in parallel.

mod attempt;
mod classifier;
mod confidence;
mod recommend;
mod report;
mod settings;
mod streak;

pub use attempt::{Attempt, record_attempt};
pub use classifier::{SubtopicInsights, SubtopicScore, classify, strong, weak};
pub use confidence::estimate as estimate_confidence;
pub use recommend::{
    AdviceBand, MIN_QUESTIONS_FOR_RECOMMENDATION, Recommendation, RecommendationRanker,
    priority_score, recommend,
};
pub use report::{
    AggregateReport, ExamTypeBreakdown, MasteryDistribution, MasteryLevel, summarize,
};
pub use settings::{AnalyticsSettings, SettingsError};
pub use streak::{STREAK_ACCURACY_THRESHOLD, touch as touch_streak};

/// Round to two decimal places, the precision used in every report.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
