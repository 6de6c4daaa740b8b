use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{AttemptSource, Difficulty, TopicProgress, accuracy_percent};
use crate::time::calendar_date;

use super::{confidence, streak};

/// A single answered question, already validated by the input gate.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Attempt {
    pub correct: bool,
    pub time_spent_secs: u64,
    pub subtopic: Option<String>,
    /// Latest difficulty rating for the topic, if the caller supplied one.
    pub difficulty: Option<Difficulty>,
    pub source: Option<AttemptSource>,
}

impl Attempt {
    #[must_use]
    pub fn new(correct: bool, time_spent_secs: u64) -> Self {
        Self {
            correct,
            time_spent_secs,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_subtopic(mut self, subtopic: impl Into<String>) -> Self {
        self.subtopic = Some(subtopic.into());
        self
    }

    #[must_use]
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: AttemptSource) -> Self {
        self.source = Some(source);
        self
    }
}

/// Apply one attempt to a record and refresh every derived field.
///
/// Runs, in order: count updates, accuracy, streak, confidence. `now` is the
/// single clock read for the whole update; the streak day is derived from it.
pub fn record_attempt(progress: &mut TopicProgress, attempt: &Attempt, now: DateTime<Utc>) {
    apply_counts(progress, attempt, now);
    recompute_accuracy(progress);
    update_streak(progress, calendar_date(now));
    update_confidence(progress);
}

fn apply_counts(progress: &mut TopicProgress, attempt: &Attempt, now: DateTime<Utc>) {
    let correct = u32::from(attempt.correct);

    progress.total_questions = progress.total_questions.saturating_add(1);
    progress.correct_answers = progress.correct_answers.saturating_add(correct);
    progress.time_spent_secs = progress
        .time_spent_secs
        .saturating_add(attempt.time_spent_secs);
    progress.last_attempted_at = now;

    if let Some(difficulty) = attempt.difficulty {
        progress.difficulty = difficulty;
    }
    if let Some(source) = attempt.source {
        progress.metadata.source = source;
    }

    // Blank names never reach a breakdown entry.
    if let Some(name) = attempt.subtopic.as_deref().filter(|s| !s.trim().is_empty()) {
        let entry = progress.subtopic_entry(name);
        entry.total_questions = entry.total_questions.saturating_add(1);
        entry.correct_answers = entry.correct_answers.saturating_add(correct);
        entry.time_spent_secs = entry.time_spent_secs.saturating_add(attempt.time_spent_secs);
    }
}

fn recompute_accuracy(progress: &mut TopicProgress) {
    let before = progress.accuracy;
    progress.accuracy = accuracy_percent(progress.correct_answers, progress.total_questions);
    progress.improvement_rate = progress.accuracy - before;
}

fn update_streak(progress: &mut TopicProgress, today: NaiveDate) {
    progress.streak = streak::touch(progress.streak, progress.accuracy, today);
}

fn update_confidence(progress: &mut TopicProgress) {
    progress.confidence = confidence::estimate(progress.accuracy, progress.streak.current);
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
