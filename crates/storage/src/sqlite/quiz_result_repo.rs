use async_trait::async_trait;
use quiz_core::model::{QuestionScore, QuizResult, SubmitTrigger};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, question_id_from_i64, question_id_to_i64, ser, u32_from_i64};
use crate::repository::{QuizResultRepository, QuizResultRow, StorageError};

impl SqliteRepository {
    async fn load_scores(&self, result_id: i64) -> Result<Vec<QuestionScore>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT question_id, topic, answer, score, max_score
                FROM quiz_result_items
                WHERE result_id = ?1
                ORDER BY position ASC
            ",
        )
        .bind(result_id)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut scores = Vec::with_capacity(rows.len());
        for row in rows {
            scores.push(QuestionScore {
                question_id: question_id_from_i64(row.try_get("question_id").map_err(ser)?)?,
                topic: row.try_get("topic").map_err(ser)?,
                answer: row.try_get("answer").map_err(ser)?,
                score: u32_from_i64("score", row.try_get("score").map_err(ser)?)?,
                max_score: u32_from_i64("max_score", row.try_get("max_score").map_err(ser)?)?,
            });
        }
        Ok(scores)
    }

    async fn map_result_row(
        &self,
        row: &sqlx::sqlite::SqliteRow,
    ) -> Result<QuizResultRow, StorageError> {
        let id: i64 = row.try_get("id").map_err(ser)?;
        let trigger: String = row.try_get("submit_trigger").map_err(ser)?;
        let trigger: SubmitTrigger = trigger.parse().map_err(StorageError::Serialization)?;
        let remaining = u32_from_i64(
            "remaining_seconds",
            row.try_get("remaining_seconds").map_err(ser)?,
        )?;
        let scores = self.load_scores(id).await?;

        Ok(QuizResultRow::new(
            id,
            QuizResult::new(
                row.try_get("started_at").map_err(ser)?,
                row.try_get("submitted_at").map_err(ser)?,
                trigger,
                remaining,
                scores,
            ),
        ))
    }
}

#[async_trait]
impl QuizResultRepository for SqliteRepository {
    async fn append_result(&self, result: &QuizResult) -> Result<i64, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let res = sqlx::query(
            r"
                INSERT INTO quiz_results (
                    started_at, submitted_at, submit_trigger, remaining_seconds
                )
                VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(result.started_at())
        .bind(result.submitted_at())
        .bind(result.trigger().as_str())
        .bind(i64::from(result.remaining_seconds()))
        .execute(&mut *tx)
        .await
        .map_err(conn)?;
        let result_id = res.last_insert_rowid();

        for (position, score) in result.scores().iter().enumerate() {
            let position = i64::try_from(position)
                .map_err(|_| StorageError::Serialization("position overflow".into()))?;
            sqlx::query(
                r"
                    INSERT INTO quiz_result_items (
                        result_id, position, question_id, topic, answer, score, max_score
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ",
            )
            .bind(result_id)
            .bind(position)
            .bind(question_id_to_i64(score.question_id)?)
            .bind(&score.topic)
            .bind(&score.answer)
            .bind(i64::from(score.score))
            .bind(i64::from(score.max_score))
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(result_id)
    }

    async fn get_result(&self, id: i64) -> Result<QuizResult, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, started_at, submitted_at, submit_trigger, remaining_seconds
                FROM quiz_results
                WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        Ok(self.map_result_row(&row).await?.result)
    }

    async fn list_results(&self, limit: u32) -> Result<Vec<QuizResultRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, started_at, submitted_at, submit_trigger, remaining_seconds
                FROM quiz_results
                ORDER BY submitted_at DESC, id DESC
                LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            out.push(self.map_result_row(row).await?);
        }
        Ok(out)
    }
}
