use progress_core::model::{ProgressKey, SubtopicProgress, TopicProgress};
use sqlx::Row;
use std::collections::HashMap;

use super::SqliteRepository;
use super::mapping::{
    conn, learner_id_to_i64, map_progress_row, map_subtopic_row, parse_exam_type, ser, u64_to_i64,
};
use crate::repository::{ProgressFilter, ProgressRepository, StorageError};

const PROGRESS_COLUMNS: &str = r"
    learner_id, topic, exam_type, total_questions, correct_answers, time_spent_secs,
    difficulty, confidence, improvement_rate, streak_current, streak_best,
    streak_last_updated, last_attempted_at, source, revision
";

const SUBTOPIC_COLUMNS: &str = r"
    topic, exam_type, subtopic, total_questions, correct_answers, time_spent_secs
";

impl SqliteRepository {
    async fn subtopics_for_key(
        &self,
        key: &ProgressKey,
    ) -> Result<Vec<SubtopicProgress>, StorageError> {
        let sql = format!(
            "SELECT {SUBTOPIC_COLUMNS} FROM subtopic_progress
             WHERE learner_id = ?1 AND topic = ?2 AND exam_type = ?3
             ORDER BY position ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(learner_id_to_i64(key.learner_id)?)
            .bind(&key.topic)
            .bind(key.exam_type.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_subtopic_row).collect()
    }
}

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn get_progress(&self, key: &ProgressKey) -> Result<Option<TopicProgress>, StorageError> {
        let sql = format!(
            "SELECT {PROGRESS_COLUMNS} FROM topic_progress
             WHERE learner_id = ?1 AND topic = ?2 AND exam_type = ?3"
        );
        let row = sqlx::query(&sql)
            .bind(learner_id_to_i64(key.learner_id)?)
            .bind(&key.topic)
            .bind(key.exam_type.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        match row {
            Some(row) => {
                let subtopics = self.subtopics_for_key(key).await?;
                map_progress_row(&row, subtopics).map(Some)
            }
            None => Ok(None),
        }
    }

    async fn list_progress(
        &self,
        filter: &ProgressFilter,
    ) -> Result<Vec<TopicProgress>, StorageError> {
        let learner = learner_id_to_i64(filter.learner_id)?;
        let exam_clause = if filter.exam_type.is_some() {
            " AND exam_type = ?2"
        } else {
            ""
        };

        let sub_sql = format!(
            "SELECT {SUBTOPIC_COLUMNS} FROM subtopic_progress
             WHERE learner_id = ?1{exam_clause}
             ORDER BY topic ASC, exam_type ASC, position ASC"
        );
        let mut sub_query = sqlx::query(&sub_sql).bind(learner);
        if let Some(exam) = filter.exam_type {
            sub_query = sub_query.bind(exam.as_str());
        }
        let sub_rows = sub_query.fetch_all(&self.pool).await.map_err(conn)?;

        let mut subtopics: HashMap<(String, String), Vec<SubtopicProgress>> = HashMap::new();
        for row in &sub_rows {
            let topic: String = row.try_get("topic").map_err(ser)?;
            let exam: String = row.try_get("exam_type").map_err(ser)?;
            subtopics
                .entry((topic, exam))
                .or_default()
                .push(map_subtopic_row(row)?);
        }

        let sql = format!(
            "SELECT {PROGRESS_COLUMNS} FROM topic_progress
             WHERE learner_id = ?1{exam_clause}
             ORDER BY topic ASC"
        );
        let mut query = sqlx::query(&sql).bind(learner);
        if let Some(exam) = filter.exam_type {
            query = query.bind(exam.as_str());
        }
        let rows = query.fetch_all(&self.pool).await.map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            let topic: String = row.try_get("topic").map_err(ser)?;
            let exam: String = row.try_get("exam_type").map_err(ser)?;
            // Reject unknown exam tokens before they reach the grouping key.
            parse_exam_type(&exam)?;
            let subs = subtopics.remove(&(topic, exam)).unwrap_or_default();
            out.push(map_progress_row(row, subs)?);
        }
        // Exam types order by enum position, not by their text.
        out.sort_by(|a, b| a.key().cmp(b.key()));
        Ok(out)
    }

    async fn upsert_progress(&self, progress: &TopicProgress) -> Result<u64, StorageError> {
        let key = progress.key();
        let learner = learner_id_to_i64(key.learner_id)?;
        let streak = progress.streak();
        let expected = progress.revision();
        let revision = expected
            .checked_add(1)
            .ok_or_else(|| StorageError::Serialization("revision overflow".into()))?;

        let mut tx = self.pool.begin().await.map_err(conn)?;

        // A fresh record may only be inserted once; an existing one only
        // while its stored revision is still the one the caller read.
        let sql = if expected == 0 {
            r"
                INSERT INTO topic_progress (
                    learner_id, topic, exam_type, total_questions, correct_answers,
                    time_spent_secs, difficulty, confidence, improvement_rate,
                    streak_current, streak_best, streak_last_updated,
                    last_attempted_at, source, revision
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
                ON CONFLICT(learner_id, topic, exam_type) DO NOTHING
            "
        } else {
            r"
                UPDATE topic_progress SET
                    total_questions = ?4,
                    correct_answers = ?5,
                    time_spent_secs = ?6,
                    difficulty = ?7,
                    confidence = ?8,
                    improvement_rate = ?9,
                    streak_current = ?10,
                    streak_best = ?11,
                    streak_last_updated = ?12,
                    last_attempted_at = ?13,
                    source = ?14,
                    revision = ?15
                WHERE learner_id = ?1 AND topic = ?2 AND exam_type = ?3
                  AND revision = ?16
            "
        };

        let mut query = sqlx::query(sql)
            .bind(learner)
            .bind(&key.topic)
            .bind(key.exam_type.as_str())
            .bind(i64::from(progress.total_questions()))
            .bind(i64::from(progress.correct_answers()))
            .bind(u64_to_i64("time_spent_secs", progress.time_spent_secs())?)
            .bind(progress.difficulty().as_str())
            .bind(progress.confidence())
            .bind(progress.improvement_rate())
            .bind(i64::from(streak.current))
            .bind(i64::from(streak.best))
            .bind(streak.last_updated)
            .bind(progress.last_attempted_at())
            .bind(progress.metadata().source.as_str())
            .bind(u64_to_i64("revision", revision)?);
        if expected > 0 {
            query = query.bind(u64_to_i64("revision", expected)?);
        }
        let written = query.execute(&mut *tx).await.map_err(conn)?;
        if written.rows_affected() == 0 {
            // Dropping the transaction rolls it back.
            return Err(StorageError::Conflict {
                key: key.clone(),
                expected,
            });
        }

        sqlx::query(
            r"
                DELETE FROM subtopic_progress
                WHERE learner_id = ?1 AND topic = ?2 AND exam_type = ?3
            ",
        )
        .bind(learner)
        .bind(&key.topic)
        .bind(key.exam_type.as_str())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        for (position, sub) in progress.subtopics().iter().enumerate() {
            sqlx::query(
                r"
                    INSERT INTO subtopic_progress (
                        learner_id, topic, exam_type, subtopic, position,
                        total_questions, correct_answers, time_spent_secs
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ",
            )
            .bind(learner)
            .bind(&key.topic)
            .bind(key.exam_type.as_str())
            .bind(sub.name())
            .bind(
                i64::try_from(position)
                    .map_err(|_| StorageError::Serialization("position overflow".into()))?,
            )
            .bind(i64::from(sub.total_questions()))
            .bind(i64::from(sub.correct_answers()))
            .bind(u64_to_i64("time_spent_secs", sub.time_spent_secs())?)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(revision)
    }
}
