use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::Utc;
use quiz_core::model::QuestionId;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, question_id_from_i64, question_id_to_i64, ser};
use crate::repository::{SolvedSetStore, StorageError};

#[async_trait]
impl SolvedSetStore for SqliteRepository {
    async fn get(&self) -> Result<BTreeSet<QuestionId>, StorageError> {
        let rows = sqlx::query("SELECT question_id FROM solved_questions")
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        let mut ids = BTreeSet::new();
        for row in rows {
            ids.insert(question_id_from_i64(
                row.try_get::<i64, _>("question_id").map_err(ser)?,
            )?);
        }
        Ok(ids)
    }

    async fn set(&self, ids: &BTreeSet<QuestionId>) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        // Keep `solved_at` for ids that survive; only touch the difference.
        let existing = sqlx::query("SELECT question_id FROM solved_questions")
            .fetch_all(&mut *tx)
            .await
            .map_err(conn)?;
        for row in existing {
            let raw: i64 = row.try_get("question_id").map_err(ser)?;
            if !ids.contains(&question_id_from_i64(raw)?) {
                sqlx::query("DELETE FROM solved_questions WHERE question_id = ?1")
                    .bind(raw)
                    .execute(&mut *tx)
                    .await
                    .map_err(conn)?;
            }
        }

        let solved_at = Utc::now();
        for id in ids {
            sqlx::query(
                r"
                    INSERT INTO solved_questions (question_id, solved_at)
                    VALUES (?1, ?2)
                    ON CONFLICT(question_id) DO NOTHING
                ",
            )
            .bind(question_id_to_i64(*id)?)
            .bind(solved_at)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM solved_questions")
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }
}
