use serde::Serialize;
use std::collections::BTreeMap;

use crate::model::{ExamType, TopicProgress};

use super::round2;

//
// ─── MASTERY ───────────────────────────────────────────────────────────────────
//

/// Mastery bucket of a record, by its own accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MasteryLevel {
    Beginner,
    Learning,
    Mastered,
}

impl MasteryLevel {
    pub const MASTERED_FROM: f64 = 80.0;
    pub const LEARNING_FROM: f64 = 40.0;

    #[must_use]
    pub fn from_accuracy(accuracy: f64) -> Self {
        if accuracy >= Self::MASTERED_FROM {
            MasteryLevel::Mastered
        } else if accuracy >= Self::LEARNING_FROM {
            MasteryLevel::Learning
        } else {
            MasteryLevel::Beginner
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MasteryDistribution {
    pub mastered: usize,
    pub learning: usize,
    pub beginner: usize,
}

impl MasteryDistribution {
    fn add(&mut self, level: MasteryLevel) {
        match level {
            MasteryLevel::Mastered => self.mastered += 1,
            MasteryLevel::Learning => self.learning += 1,
            MasteryLevel::Beginner => self.beginner += 1,
        }
    }
}

//
// ─── REPORT ────────────────────────────────────────────────────────────────────
//

/// Per exam type roll-up.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExamTypeBreakdown {
    pub exam_type: ExamType,
    pub topic_count: usize,
    pub average_accuracy: f64,
    pub total_questions: u64,
}

/// Dashboard statistics over a set of progress records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateReport {
    pub total_topics: usize,
    pub total_questions: u64,
    pub total_correct: u64,
    pub total_time_spent_secs: u64,
    pub average_accuracy: f64,
    pub overall_accuracy: f64,
    pub mastery: MasteryDistribution,
    /// Ordered by exam type.
    pub by_exam_type: Vec<ExamTypeBreakdown>,
}

#[derive(Default)]
struct Totals {
    topics: usize,
    questions: u64,
    correct: u64,
    time_secs: u64,
    accuracy_sum: f64,
}

impl Totals {
    fn add(&mut self, record: &TopicProgress) {
        self.topics += 1;
        self.questions += u64::from(record.total_questions());
        self.correct += u64::from(record.correct_answers());
        self.time_secs = self.time_secs.saturating_add(record.time_spent_secs());
        self.accuracy_sum += record.accuracy();
    }

    #[allow(clippy::cast_precision_loss)]
    fn average_accuracy(&self) -> f64 {
        if self.topics == 0 {
            return 0.0;
        }
        round2(self.accuracy_sum / self.topics as f64)
    }

    #[allow(clippy::cast_precision_loss)]
    fn overall_accuracy(&self) -> f64 {
        if self.questions == 0 {
            return 0.0;
        }
        round2(100.0 * self.correct as f64 / self.questions as f64)
    }
}

/// Roll up records, optionally restricted to one exam type.
///
/// Every ratio over an empty set is `0.0`.
#[must_use]
pub fn summarize(records: &[TopicProgress], exam_type: Option<ExamType>) -> AggregateReport {
    let mut totals = Totals::default();
    let mut mastery = MasteryDistribution::default();
    let mut per_exam: BTreeMap<ExamType, Totals> = BTreeMap::new();

    for record in records
        .iter()
        .filter(|r| exam_type.is_none_or(|e| r.key().exam_type == e))
    {
        totals.add(record);
        mastery.add(MasteryLevel::from_accuracy(record.accuracy()));
        per_exam.entry(record.key().exam_type).or_default().add(record);
    }

    let by_exam_type = per_exam
        .into_iter()
        .map(|(exam_type, t)| ExamTypeBreakdown {
            exam_type,
            topic_count: t.topics,
            average_accuracy: t.average_accuracy(),
            total_questions: t.questions,
        })
        .collect();

    AggregateReport {
        total_topics: totals.topics,
        total_questions: totals.questions,
        total_correct: totals.correct,
        total_time_spent_secs: totals.time_secs,
        average_accuracy: totals.average_accuracy(),
        overall_accuracy: totals.overall_accuracy(),
        mastery,
        by_exam_type,
    }
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

    fn record(topic: &str, exam: ExamType, total: u32, correct: u32, secs: u64) -> TopicProgress {
        TopicProgress::from_persisted(
            ProgressKey::new(LearnerId::new(1), topic, exam),
            total,
            correct,
            secs,
            Difficulty::Medium,
            0.0,
            0.0,
            Vec::new(),
            StreakState::default(),
            fixed_now(),
            ProgressMetadata {
                source: AttemptSource::Practice,
            },
        )
        .unwrap()
    }

    #[test]
    fn empty_input_yields_zeroes() {
        let report = summarize(&[], None);
        assert_eq!(report.total_topics, 0);
        assert_eq!(report.total_questions, 0);
        assert_eq!(report.overall_accuracy, 0.0);
        assert_eq!(report.average_accuracy, 0.0);
        assert_eq!(report.mastery, MasteryDistribution::default());
        assert!(report.by_exam_type.is_empty());
    }

    #[test]
    fn records_without_questions_do_not_divide_by_zero() {
        let records = [record("Idle", ExamType::Gre, 0, 0, 0)];
        let report = summarize(&records, None);
        assert_eq!(report.total_topics, 1);
        assert_eq!(report.overall_accuracy, 0.0);
        assert_eq!(report.mastery.beginner, 1);
    }

    #[test]
    fn totals_averages_and_rounding() {
        let records = [
            record("Algebra", ExamType::Jee, 3, 2, 100),
            record("Optics", ExamType::Jee, 10, 9, 50),
            record("Cells", ExamType::Neet, 20, 5, 70),
        ];
        let report = summarize(&records, None);

        assert_eq!(report.total_topics, 3);
        assert_eq!(report.total_questions, 33);
        assert_eq!(report.total_correct, 16);
        assert_eq!(report.total_time_spent_secs, 220);
        // (66.666.. + 90 + 25) / 3
        assert_eq!(report.average_accuracy, 60.56);
        // 16 / 33
        assert_eq!(report.overall_accuracy, 48.48);
    }

    #[test]
    fn mastery_bucket_boundaries() {
        assert_eq!(MasteryLevel::from_accuracy(80.0), MasteryLevel::Mastered);
        assert_eq!(MasteryLevel::from_accuracy(79.99), MasteryLevel::Learning);
        assert_eq!(MasteryLevel::from_accuracy(40.0), MasteryLevel::Learning);
        assert_eq!(MasteryLevel::from_accuracy(39.99), MasteryLevel::Beginner);

        let records = [
            record("A", ExamType::Cat, 10, 8, 0),
            record("B", ExamType::Cat, 10, 4, 0),
            record("C", ExamType::Cat, 10, 3, 0),
            record("D", ExamType::Cat, 10, 10, 0),
        ];
        let mastery = summarize(&records, None).mastery;
        assert_eq!(
            mastery,
            MasteryDistribution {
                mastered: 2,
                learning: 1,
                beginner: 1
            }
        );
    }

    #[test]
    fn breakdown_is_per_exam_type() {
        let records = [
            record("Cells", ExamType::Neet, 4, 1, 0),
            record("Algebra", ExamType::Jee, 10, 5, 0),
            record("Optics", ExamType::Jee, 10, 10, 0),
        ];
        let report = summarize(&records, None);

        assert_eq!(report.by_exam_type.len(), 2);
        let jee = &report.by_exam_type[0];
        assert_eq!(jee.exam_type, ExamType::Jee);
        assert_eq!(jee.topic_count, 2);
        assert_eq!(jee.average_accuracy, 75.0);
        assert_eq!(jee.total_questions, 20);
        let neet = &report.by_exam_type[1];
        assert_eq!(neet.exam_type, ExamType::Neet);
        assert_eq!(neet.average_accuracy, 25.0);
    }

    #[test]
    fn exam_filter_restricts_every_figure() {
        let records = [
            record("Cells", ExamType::Neet, 4, 1, 30),
            record("Algebra", ExamType::Jee, 10, 5, 10),
        ];
        let report = summarize(&records, Some(ExamType::Neet));
        assert_eq!(report.total_topics, 1);
        assert_eq!(report.total_questions, 4);
        assert_eq!(report.total_time_spent_secs, 30);
        assert_eq!(report.overall_accuracy, 25.0);
        assert_eq!(report.by_exam_type.len(), 1);

        let none = summarize(&records, Some(ExamType::Sat));
        assert_eq!(none.total_topics, 0);
        assert_eq!(none.overall_accuracy, 0.0);
    }
}
