use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::{AttemptSource, Difficulty, ProgressKey};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors raised when building or rehydrating a progress record.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("topic name cannot be empty")]
    EmptyTopic,

    #[error("subtopic name cannot be empty")]
    EmptySubtopic,

    #[error("correct answers ({correct}) exceed total questions ({total})")]
    CorrectExceedsTotal { correct: u32, total: u32 },

    #[error("subtopic {subtopic:?}: correct answers ({correct}) exceed total questions ({total})")]
    SubtopicCorrectExceedsTotal {
        subtopic: String,
        correct: u32,
        total: u32,
    },

    #[error("duplicate subtopic: {0:?}")]
    DuplicateSubtopic(String),

    #[error("confidence must be within [0, 100], got {0}")]
    InvalidConfidence(f64),

    #[error("improvement rate must be finite, got {0}")]
    InvalidImprovementRate(f64),

    #[error("best streak ({best}) is lower than current streak ({current})")]
    InvalidStreak { current: u32, best: u32 },
}

/// Percentage of correct answers, or `0.0` when nothing has been answered.
#[must_use]
pub fn accuracy_percent(correct: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    100.0 * f64::from(correct) / f64::from(total)
}

//
// ─── STREAK ────────────────────────────────────────────────────────────────────
//

/// Daily-activity streak for one topic.
///
/// `current` moves at most once per calendar day; `best` never decreases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakState {
    pub current: u32,
    pub best: u32,
    pub last_updated: Option<NaiveDate>,
}

impl StreakState {
    /// Rehydrate a streak from storage.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::InvalidStreak` if `best < current`.
    pub fn from_persisted(
        current: u32,
        best: u32,
        last_updated: Option<NaiveDate>,
    ) -> Result<Self, ProgressError> {
        if best < current {
            return Err(ProgressError::InvalidStreak { current, best });
        }
        Ok(Self {
            current,
            best,
            last_updated,
        })
    }
}

//
// ─── SUBTOPIC ──────────────────────────────────────────────────────────────────
//

/// Per-subtopic counters inside a topic record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubtopicProgress {
    pub(crate) name: String,
    pub(crate) total_questions: u32,
    pub(crate) correct_answers: u32,
    pub(crate) time_spent_secs: u64,
}

impl SubtopicProgress {
    pub(crate) fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            total_questions: 0,
            correct_answers: 0,
            time_spent_secs: 0,
        }
    }

    /// Rehydrate a subtopic entry from storage.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if the name is blank or counts are inconsistent.
    pub fn from_persisted(
        name: impl Into<String>,
        total_questions: u32,
        correct_answers: u32,
        time_spent_secs: u64,
    ) -> Result<Self, ProgressError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ProgressError::EmptySubtopic);
        }
        if correct_answers > total_questions {
            return Err(ProgressError::SubtopicCorrectExceedsTotal {
                subtopic: name,
                correct: correct_answers,
                total: total_questions,
            });
        }
        Ok(Self {
            name,
            total_questions,
            correct_answers,
            time_spent_secs,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    #[must_use]
    pub fn time_spent_secs(&self) -> u64 {
        self.time_spent_secs
    }

    /// `None` until the subtopic has been attempted at least once.
    #[must_use]
    pub fn accuracy(&self) -> Option<f64> {
        (self.total_questions > 0)
            .then(|| accuracy_percent(self.correct_answers, self.total_questions))
    }
}

//
// ─── METADATA ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressMetadata {
    pub source: AttemptSource,
}

//
// ─── TOPIC PROGRESS ────────────────────────────────────────────────────────────
//

/// One evolving performance record per learner, topic and exam type.
///
/// Counters only change through [`crate::analytics::record_attempt`], which
/// recomputes `accuracy`, the streak and `confidence` in a fixed order. There
/// is no setter for any derived field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicProgress {
    pub(crate) key: ProgressKey,
    pub(crate) total_questions: u32,
    pub(crate) correct_answers: u32,
    pub(crate) time_spent_secs: u64,
    pub(crate) accuracy: f64,
    pub(crate) difficulty: Difficulty,
    pub(crate) confidence: f64,
    pub(crate) improvement_rate: f64,
    pub(crate) subtopics: Vec<SubtopicProgress>,
    pub(crate) streak: StreakState,
    pub(crate) last_attempted_at: DateTime<Utc>,
    pub(crate) metadata: ProgressMetadata,
    /// Storage revision this copy was read at; `0` until first stored.
    #[serde(skip)]
    pub(crate) revision: u64,
}

impl TopicProgress {
    /// Start an empty record for a learner's first attempt at a topic.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::EmptyTopic` if the topic name is blank.
    pub fn new(
        key: ProgressKey,
        difficulty: Difficulty,
        source: AttemptSource,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ProgressError> {
        if key.topic.trim().is_empty() {
            return Err(ProgressError::EmptyTopic);
        }
        Ok(Self {
            key,
            total_questions: 0,
            correct_answers: 0,
            time_spent_secs: 0,
            accuracy: 0.0,
            difficulty,
            confidence: 0.0,
            improvement_rate: 0.0,
            subtopics: Vec::new(),
            streak: StreakState::default(),
            last_attempted_at: created_at,
            metadata: ProgressMetadata { source },
            revision: 0,
        })
    }

    /// Rehydrate a record from persisted storage.
    ///
    /// Accuracy is never read back from storage; it is recomputed from the
    /// counters.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if counts, subtopics, confidence or streak are
    /// inconsistent.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        key: ProgressKey,
        total_questions: u32,
        correct_answers: u32,
        time_spent_secs: u64,
        difficulty: Difficulty,
        confidence: f64,
        improvement_rate: f64,
        subtopics: Vec<SubtopicProgress>,
        streak: StreakState,
        last_attempted_at: DateTime<Utc>,
        metadata: ProgressMetadata,
    ) -> Result<Self, ProgressError> {
        if key.topic.trim().is_empty() {
            return Err(ProgressError::EmptyTopic);
        }
        if correct_answers > total_questions {
            return Err(ProgressError::CorrectExceedsTotal {
                correct: correct_answers,
                total: total_questions,
            });
        }
        if !confidence.is_finite() || !(0.0..=100.0).contains(&confidence) {
            return Err(ProgressError::InvalidConfidence(confidence));
        }
        if !improvement_rate.is_finite() {
            return Err(ProgressError::InvalidImprovementRate(improvement_rate));
        }
        if streak.best < streak.current {
            return Err(ProgressError::InvalidStreak {
                current: streak.current,
                best: streak.best,
            });
        }
        let mut seen = HashSet::with_capacity(subtopics.len());
        for sub in &subtopics {
            if !seen.insert(sub.name.as_str()) {
                return Err(ProgressError::DuplicateSubtopic(sub.name.clone()));
            }
        }

        Ok(Self {
            key,
            total_questions,
            correct_answers,
            time_spent_secs,
            accuracy: accuracy_percent(correct_answers, total_questions),
            difficulty,
            confidence,
            improvement_rate,
            subtopics,
            streak,
            last_attempted_at,
            metadata,
            revision: 0,
        })
    }

    /// Tag the record with the storage revision it was read at.
    #[must_use]
    pub fn with_revision(mut self, revision: u64) -> Self {
        self.revision = revision;
        self
    }

    #[must_use]
    pub fn key(&self) -> &ProgressKey {
        &self.key
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.key.topic
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    #[must_use]
    pub fn time_spent_secs(&self) -> u64 {
        self.time_spent_secs
    }

    /// Percentage of correct answers; `0.0` before the first attempt.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Accuracy change, in percentage points, caused by the latest attempt.
    #[must_use]
    pub fn improvement_rate(&self) -> f64 {
        self.improvement_rate
    }

    /// Subtopic entries in the order they were first attempted.
    #[must_use]
    pub fn subtopics(&self) -> &[SubtopicProgress] {
        &self.subtopics
    }

    #[must_use]
    pub fn subtopic(&self, name: &str) -> Option<&SubtopicProgress> {
        self.subtopics.iter().find(|s| s.name == name)
    }

    #[must_use]
    pub fn streak(&self) -> &StreakState {
        &self.streak
    }

    #[must_use]
    pub fn last_attempted_at(&self) -> DateTime<Utc> {
        self.last_attempted_at
    }

    #[must_use]
    pub fn metadata(&self) -> ProgressMetadata {
        self.metadata
    }

    /// Storage revision this copy was read at. A write is only accepted
    /// while the stored revision still matches.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Accuracy per average second spent on a question, scaled by 100.
    ///
    /// Returns `0.0` when no time has been recorded. The unit is loosely
    /// defined; treat it as a relative indicator only.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn efficiency(&self) -> f64 {
        if self.time_spent_secs == 0 || self.total_questions == 0 {
            return 0.0;
        }
        let secs_per_question = self.time_spent_secs as f64 / f64::from(self.total_questions);
        self.accuracy / secs_per_question * 100.0
    }

    pub(crate) fn subtopic_entry(&mut self, name: &str) -> &mut SubtopicProgress {
        let idx = match self.subtopics.iter().position(|s| s.name == name) {
            Some(idx) => idx,
            None => {
                self.subtopics.push(SubtopicProgress::empty(name));
                self.subtopics.len() - 1
            }
        };
        &mut self.subtopics[idx]
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
