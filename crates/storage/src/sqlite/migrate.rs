use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs the schema migrations that have not been applied yet.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: topic progress with its subtopic breakdown.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS topic_progress (
                    learner_id INTEGER NOT NULL,
                    topic TEXT NOT NULL,
                    exam_type TEXT NOT NULL,
                    total_questions INTEGER NOT NULL CHECK (total_questions >= 0),
                    correct_answers INTEGER NOT NULL
                        CHECK (correct_answers >= 0 AND correct_answers <= total_questions),
                    time_spent_secs INTEGER NOT NULL CHECK (time_spent_secs >= 0),
                    difficulty TEXT NOT NULL,
                    confidence REAL NOT NULL CHECK (confidence BETWEEN 0 AND 100),
                    improvement_rate REAL NOT NULL,
                    streak_current INTEGER NOT NULL CHECK (streak_current >= 0),
                    streak_best INTEGER NOT NULL CHECK (streak_best >= streak_current),
                    streak_last_updated TEXT,
                    last_attempted_at TEXT NOT NULL,
                    source TEXT NOT NULL,
                    revision INTEGER NOT NULL CHECK (revision > 0),
                    PRIMARY KEY (learner_id, topic, exam_type)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS subtopic_progress (
                    learner_id INTEGER NOT NULL,
                    topic TEXT NOT NULL,
                    exam_type TEXT NOT NULL,
                    subtopic TEXT NOT NULL,
                    position INTEGER NOT NULL,
                    total_questions INTEGER NOT NULL CHECK (total_questions >= 0),
                    correct_answers INTEGER NOT NULL
                        CHECK (correct_answers >= 0 AND correct_answers <= total_questions),
                    time_spent_secs INTEGER NOT NULL CHECK (time_spent_secs >= 0),
                    PRIMARY KEY (learner_id, topic, exam_type, subtopic),
                    FOREIGN KEY (learner_id, topic, exam_type)
                        REFERENCES topic_progress(learner_id, topic, exam_type) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_topic_progress_learner_exam
                    ON topic_progress (learner_id, exam_type);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}
