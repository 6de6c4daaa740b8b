use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::model::{ExamType, TopicProgress};

use super::AnalyticsSettings;

/// Topics with fewer answered questions carry too little signal to rank.
pub const MIN_QUESTIONS_FOR_RECOMMENDATION: u32 = 5;

const ACCURACY_WEIGHT: f64 = 0.6;
const CONFIDENCE_WEIGHT: f64 = 0.3;
const RECENCY_WEIGHT: f64 = 0.1;
const SECONDS_PER_DAY: f64 = 86_400.0;

//
// ─── ADVICE ────────────────────────────────────────────────────────────────────
//

/// Study advice for an accuracy band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdviceBand {
    FocusOnFundamentals,
    PracticeBasics,
    WorkOnApplications,
    MasterAdvanced,
    MaintainProficiency,
}

impl AdviceBand {
    /// Bands are checked from the lowest upper bound up; the first match wins.
    #[must_use]
    pub fn from_accuracy(accuracy: f64) -> Self {
        if accuracy < 40.0 {
            AdviceBand::FocusOnFundamentals
        } else if accuracy < 60.0 {
            AdviceBand::PracticeBasics
        } else if accuracy < 75.0 {
            AdviceBand::WorkOnApplications
        } else if accuracy < 90.0 {
            AdviceBand::MasterAdvanced
        } else {
            AdviceBand::MaintainProficiency
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            AdviceBand::FocusOnFundamentals => "Focus on fundamental concepts",
            AdviceBand::PracticeBasics => "Practice basic problems",
            AdviceBand::WorkOnApplications => "Work on application problems",
            AdviceBand::MasterAdvanced => "Master advanced concepts",
            AdviceBand::MaintainProficiency => "Maintain proficiency with occasional practice",
        }
    }
}

impl Serialize for AdviceBand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.message())
    }
}

//
// ─── RANKING ───────────────────────────────────────────────────────────────────
//

/// One ranked topic, highest priority first in the ranker's output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub topic: String,
    pub exam_type: ExamType,
    pub accuracy: f64,
    pub confidence: f64,
    pub last_attempted_at: DateTime<Utc>,
    pub priority: f64,
    pub recommendation: AdviceBand,
}

/// Study-next priority; higher means sooner.
///
/// Weak accuracy dominates, low confidence follows, and recency only breaks
/// near-ties in favour of the topic touched more recently.
#[must_use]
pub fn priority_score(accuracy: f64, confidence: f64, days_since_last_attempt: f64) -> f64 {
    let days = days_since_last_attempt.max(0.0);
    ACCURACY_WEIGHT * (100.0 - accuracy)
        + CONFIDENCE_WEIGHT * (100.0 - confidence)
        + RECENCY_WEIGHT * (1.0 / (1.0 + days))
}

#[allow(clippy::cast_precision_loss)]
fn days_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    later.signed_duration_since(earlier).num_seconds() as f64 / SECONDS_PER_DAY
}

/// Ranks topics by [`priority_score`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendationRanker {
    min_questions: u32,
}

impl Default for RecommendationRanker {
    fn default() -> Self {
        Self {
            min_questions: MIN_QUESTIONS_FOR_RECOMMENDATION,
        }
    }
}

impl RecommendationRanker {
    #[must_use]
    pub fn new(settings: &AnalyticsSettings) -> Self {
        Self {
            min_questions: settings.min_questions_for_recommendation(),
        }
    }

    #[must_use]
    pub fn is_eligible(&self, record: &TopicProgress) -> bool {
        record.total_questions() >= self.min_questions
    }

    /// Top `limit` eligible topics. Equal priorities keep input order.
    #[must_use]
    pub fn rank(
        &self,
        records: &[TopicProgress],
        limit: usize,
        now: DateTime<Utc>,
    ) -> Vec<Recommendation> {
        let mut ranked: Vec<Recommendation> = records
            .iter()
            .filter(|r| self.is_eligible(r))
            .map(|r| Recommendation {
                topic: r.topic().to_owned(),
                exam_type: r.key().exam_type,
                accuracy: r.accuracy(),
                confidence: r.confidence(),
                last_attempted_at: r.last_attempted_at(),
                priority: priority_score(
                    r.accuracy(),
                    r.confidence(),
                    days_between(r.last_attempted_at(), now),
                ),
                recommendation: AdviceBand::from_accuracy(r.accuracy()),
            })
            .collect();

        ranked.sort_by(|a, b| b.priority.total_cmp(&a.priority));
        ranked.truncate(limit);
        ranked
    }
}

/// Rank with the default eligibility bar.
#[must_use]
pub fn recommend(
    records: &[TopicProgress],
    limit: usize,
    now: DateTime<Utc>,
) -> Vec<Recommendation> {
    RecommendationRanker::default().rank(records, limit, now)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AttemptSource, Difficulty, LearnerId, ProgressKey, ProgressMetadata, StreakState,
    };
    use crate::time::fixed_now;
    use chrono::Duration;

    fn record(
        topic: &str,
        total: u32,
        correct: u32,
        confidence: f64,
        last: DateTime<Utc>,
    ) -> TopicProgress {
        TopicProgress::from_persisted(
            ProgressKey::new(LearnerId::new(1), topic, ExamType::Gate),
            total,
            correct,
            0,
            Difficulty::Medium,
            confidence,
            0.0,
            Vec::new(),
            StreakState::default(),
            last,
            ProgressMetadata {
                source: AttemptSource::Test,
            },
        )
        .unwrap()
    }

    fn topics(recs: &[Recommendation]) -> Vec<&str> {
        recs.iter().map(|r| r.topic.as_str()).collect()
    }

    #[test]
    fn advice_bands_are_half_open() {
        assert_eq!(AdviceBand::from_accuracy(0.0), AdviceBand::FocusOnFundamentals);
        assert_eq!(AdviceBand::from_accuracy(39.9), AdviceBand::FocusOnFundamentals);
        assert_eq!(AdviceBand::from_accuracy(40.0), AdviceBand::PracticeBasics);
        assert_eq!(AdviceBand::from_accuracy(60.0), AdviceBand::WorkOnApplications);
        assert_eq!(AdviceBand::from_accuracy(75.0), AdviceBand::MasterAdvanced);
        assert_eq!(AdviceBand::from_accuracy(89.99), AdviceBand::MasterAdvanced);
        assert_eq!(AdviceBand::from_accuracy(90.0), AdviceBand::MaintainProficiency);
        assert_eq!(
            AdviceBand::from_accuracy(100.0).message(),
            "Maintain proficiency with occasional practice"
        );
    }

    #[test]
    fn priority_weights() {
        // Fresh topic, zero accuracy and confidence: 60 + 30 + 0.1.
        assert!((priority_score(0.0, 0.0, 0.0) - 90.1).abs() < 1e-9);
        // Perfect topic, a day old: only the recency term remains.
        assert!((priority_score(100.0, 100.0, 1.0) - 0.05).abs() < 1e-9);
        // Future timestamps count as today.
        assert_eq!(priority_score(50.0, 50.0, -3.0), priority_score(50.0, 50.0, 0.0));
    }

    #[test]
    fn recent_topic_outranks_neglected_twin() {
        let now = fixed_now();
        let records = [
            record("B", 10, 3, 40.0, now - Duration::days(30)),
            record("A", 10, 3, 40.0, now),
        ];
        let ranked = recommend(&records, 5, now);
        assert_eq!(topics(&ranked), ["A", "B"]);
        assert!(ranked[0].priority > ranked[1].priority);
        assert_eq!(ranked[0].recommendation, AdviceBand::FocusOnFundamentals);
    }

    #[test]
    fn weak_topics_rank_first_and_limit_applies() {
        let now = fixed_now();
        let records = [
            record("Strong", 10, 10, 100.0, now),
            record("Weak", 10, 2, 30.0, now),
            record("Middle", 10, 6, 60.0, now),
        ];
        let ranked = recommend(&records, 2, now);
        assert_eq!(topics(&ranked), ["Weak", "Middle"]);
        assert_eq!(ranked[1].recommendation.message(), "Work on application problems");
    }

    #[test]
    fn insufficient_data_is_excluded() {
        let now = fixed_now();
        let records = [
            record("Four", 4, 0, 0.0, now),
            record("Five", 5, 5, 100.0, now),
        ];
        assert_eq!(topics(&recommend(&records, 5, now)), ["Five"]);

        let strict =
            RecommendationRanker::new(&AnalyticsSettings::new(60.0, 80.0, 5, 6).unwrap());
        assert!(strict.rank(&records, 5, now).is_empty());
    }

    #[test]
    fn equal_priorities_keep_input_order() {
        let now = fixed_now();
        let records = [
            record("First", 10, 5, 50.0, now),
            record("Second", 10, 5, 50.0, now),
            record("Third", 10, 5, 50.0, now),
        ];
        assert_eq!(topics(&recommend(&records, 5, now)), ["First", "Second", "Third"]);
    }

    #[test]
    fn empty_input_and_zero_limit() {
        let now = fixed_now();
        assert!(recommend(&[], 5, now).is_empty());
        let records = [record("Only", 10, 5, 50.0, now)];
        assert!(recommend(&records, 0, now).is_empty());
    }
}
