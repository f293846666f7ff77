use quiz_core::model::{HistoryEntry, HistoryId, NewHistoryEntry, QuestionId};
use quiz_core::stats::CategoryTally;

use super::{
    SqliteRepository,
    mapping::{db_err, history_id_from_i64, id_to_i64, map_history_row, map_tally_row},
};
use crate::repository::{HistoryRepository, StorageError};

#[async_trait::async_trait]
impl HistoryRepository for SqliteRepository {
    async fn append_entry(&self, entry: &NewHistoryEntry) -> Result<HistoryId, StorageError> {
        let question_id = id_to_i64("question_id", entry.question_id.value())?;

        let res = sqlx::query(
            r"
                INSERT INTO history (question_id, is_correct, answered_at)
                VALUES (?1, ?2, ?3)
            ",
        )
        .bind(question_id)
        .bind(i64::from(entry.is_correct))
        .bind(entry.answered_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        history_id_from_i64(res.last_insert_rowid())
    }

    async fn entries_for_question(
        &self,
        question_id: QuestionId,
    ) -> Result<Vec<HistoryEntry>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, question_id, is_correct, answered_at
                FROM history
                WHERE question_id = ?1
                ORDER BY answered_at ASC, id ASC
            ",
        )
        .bind(id_to_i64("question_id", question_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_history_row(&row)?);
        }
        Ok(out)
    }

    async fn category_tallies(&self) -> Result<Vec<CategoryTally>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT q.category AS category,
                       COUNT(*) AS total,
                       SUM(CASE WHEN h.is_correct = 1 THEN 1 ELSE 0 END) AS correct
                FROM history h
                JOIN questions q ON q.id = h.question_id
                GROUP BY q.category
                HAVING COUNT(*) > 0
                ORDER BY q.category
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_tally_row(&row)?);
        }
        Ok(out)
    }
}
