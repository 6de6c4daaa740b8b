use serde::Serialize;

use crate::model::TopicProgress;

use super::AnalyticsSettings;

/// Accuracy snapshot of one attempted subtopic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubtopicScore {
    pub subtopic: String,
    pub accuracy: f64,
    pub total_questions: u32,
}

/// Weak and strong subtopics of a single record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubtopicInsights {
    pub weak: Vec<SubtopicScore>,
    pub strong: Vec<SubtopicScore>,
}

fn scored(record: &TopicProgress) -> impl Iterator<Item = SubtopicScore> + '_ {
    record.subtopics().iter().filter_map(|sub| {
        sub.accuracy().map(|accuracy| SubtopicScore {
            subtopic: sub.name().to_owned(),
            accuracy,
            total_questions: sub.total_questions(),
        })
    })
}

/// Subtopics below `threshold`, worst first.
///
/// Unattempted subtopics are left out. Equal accuracies keep insertion order.
#[must_use]
pub fn weak(record: &TopicProgress, threshold: f64) -> Vec<SubtopicScore> {
    let mut out: Vec<_> = scored(record).filter(|s| s.accuracy < threshold).collect();
    out.sort_by(|a, b| a.accuracy.total_cmp(&b.accuracy));
    out
}

/// Subtopics at or above `threshold`, best first.
///
/// Unattempted subtopics are left out. Equal accuracies keep insertion order.
#[must_use]
pub fn strong(record: &TopicProgress, threshold: f64) -> Vec<SubtopicScore> {
    let mut out: Vec<_> = scored(record).filter(|s| s.accuracy >= threshold).collect();
    out.sort_by(|a, b| b.accuracy.total_cmp(&a.accuracy));
    out
}

/// Both lists using the configured thresholds.
#[must_use]
pub fn classify(record: &TopicProgress, settings: &AnalyticsSettings) -> SubtopicInsights {
    SubtopicInsights {
        weak: weak(record, settings.weak_threshold()),
        strong: strong(record, settings.strong_threshold()),
    }
}
