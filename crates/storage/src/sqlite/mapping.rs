use chrono::{DateTime, NaiveDate, Utc};
use progress_core::model::{
    AttemptSource, Difficulty, ExamType, LearnerId, ProgressKey, ProgressMetadata, StreakState,
    SubtopicProgress, TopicProgress,
};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn learner_id_to_i64(id: LearnerId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Serialization("learner_id overflow".into()))
}

pub(crate) fn u64_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

fn learner_id_from_i64(v: i64) -> Result<LearnerId, StorageError> {
    u64::try_from(v)
        .map(LearnerId::new)
        .map_err(|_| StorageError::Serialization("learner_id sign overflow".into()))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

fn u64_from_i64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn parse_exam_type(s: &str) -> Result<ExamType, StorageError> {
    s.parse().map_err(ser)
}

fn parse_difficulty(s: &str) -> Result<Difficulty, StorageError> {
    s.parse().map_err(ser)
}

fn parse_source(s: &str) -> Result<AttemptSource, StorageError> {
    s.parse().map_err(ser)
}

pub(crate) fn map_subtopic_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<SubtopicProgress, StorageError> {
    let name: String = row.try_get("subtopic").map_err(ser)?;
    let total = u32_from_i64(
        "total_questions",
        row.try_get::<i64, _>("total_questions").map_err(ser)?,
    )?;
    let correct = u32_from_i64(
        "correct_answers",
        row.try_get::<i64, _>("correct_answers").map_err(ser)?,
    )?;
    let secs = u64_from_i64(
        "time_spent_secs",
        row.try_get::<i64, _>("time_spent_secs").map_err(ser)?,
    )?;
    SubtopicProgress::from_persisted(name, total, correct, secs).map_err(ser)
}

/// Decode a `topic_progress` row; subtopics are loaded separately.
pub(crate) fn map_progress_row(
    row: &sqlx::sqlite::SqliteRow,
    subtopics: Vec<SubtopicProgress>,
) -> Result<TopicProgress, StorageError> {
    let key = ProgressKey::new(
        learner_id_from_i64(row.try_get::<i64, _>("learner_id").map_err(ser)?)?,
        row.try_get::<String, _>("topic").map_err(ser)?,
        parse_exam_type(&row.try_get::<String, _>("exam_type").map_err(ser)?)?,
    );

    let streak = StreakState::from_persisted(
        u32_from_i64(
            "streak_current",
            row.try_get::<i64, _>("streak_current").map_err(ser)?,
        )?,
        u32_from_i64("streak_best", row.try_get::<i64, _>("streak_best").map_err(ser)?)?,
        row.try_get::<Option<NaiveDate>, _>("streak_last_updated")
            .map_err(ser)?,
    )
    .map_err(ser)?;

    let last_attempted_at: DateTime<Utc> = row.try_get("last_attempted_at").map_err(ser)?;
    let metadata = ProgressMetadata {
        source: parse_source(&row.try_get::<String, _>("source").map_err(ser)?)?,
    };
    let revision = u64_from_i64("revision", row.try_get::<i64, _>("revision").map_err(ser)?)?;

    TopicProgress::from_persisted(
        key,
        u32_from_i64(
            "total_questions",
            row.try_get::<i64, _>("total_questions").map_err(ser)?,
        )?,
        u32_from_i64(
            "correct_answers",
            row.try_get::<i64, _>("correct_answers").map_err(ser)?,
        )?,
        u64_from_i64(
            "time_spent_secs",
            row.try_get::<i64, _>("time_spent_secs").map_err(ser)?,
        )?,
        parse_difficulty(&row.try_get::<String, _>("difficulty").map_err(ser)?)?,
        row.try_get("confidence").map_err(ser)?,
        row.try_get("improvement_rate").map_err(ser)?,
        subtopics,
        streak,
        last_attempted_at,
        metadata,
    )
    .map_err(ser)
    .map(|progress| progress.with_revision(revision))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_columns_reject_unknown_tokens() {
        assert!(matches!(
            parse_exam_type("toefl"),
            Err(StorageError::Serialization(_))
        ));
        assert_eq!(parse_difficulty("hard").unwrap(), Difficulty::Hard);
        assert_eq!(parse_source("quiz").unwrap(), AttemptSource::Quiz);
    }

    #[test]
    fn negative_integers_are_rejected() {
        assert!(learner_id_from_i64(-1).is_err());
        assert!(u32_from_i64("total_questions", -3).is_err());
        assert_eq!(u64_to_i64("time_spent_secs", 42).unwrap(), 42);
        assert!(u64_to_i64("time_spent_secs", u64::MAX).is_err());
    }
}
