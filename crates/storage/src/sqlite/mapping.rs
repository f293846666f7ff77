use quiz_core::model::{HistoryEntry, HistoryId, Question, QuestionId};
use quiz_core::stats::CategoryTally;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Maps driver errors; foreign key violations become `Conflict`.
pub(crate) fn db_err(e: sqlx::Error) -> StorageError {
    match &e {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => StorageError::Conflict,
        _ => StorageError::Connection(e.to_string()),
    }
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    Ok(QuestionId::new(i64_to_u64("question_id", v)?))
}

pub(crate) fn history_id_from_i64(v: i64) -> Result<HistoryId, StorageError> {
    Ok(HistoryId::new(i64_to_u64("history_id", v)?))
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<Question, StorageError> {
    Ok(Question {
        id: question_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        exam_type: row.try_get("exam_type").map_err(ser)?,
        category: row.try_get("category").map_err(ser)?,
        scenario: row.try_get("scenario").map_err(ser)?,
        question_text: row.try_get("question_text").map_err(ser)?,
        option_a: row.try_get("option_a").map_err(ser)?,
        option_b: row.try_get("option_b").map_err(ser)?,
        option_c: row.try_get("option_c").map_err(ser)?,
        option_d: row.try_get("option_d").map_err(ser)?,
        correct_answer: row.try_get("correct_answer").map_err(ser)?,
        explanation: row.try_get("explanation").map_err(ser)?,
    })
}

pub(crate) fn map_history_row(row: &SqliteRow) -> Result<HistoryEntry, StorageError> {
    let is_correct = match row.try_get::<i64, _>("is_correct").map_err(ser)? {
        0 => false,
        1 => true,
        other => {
            return Err(StorageError::Serialization(format!(
                "invalid is_correct: {other}"
            )));
        }
    };
    Ok(HistoryEntry {
        id: history_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        question_id: question_id_from_i64(row.try_get::<i64, _>("question_id").map_err(ser)?)?,
        is_correct,
        answered_at: row.try_get("answered_at").map_err(ser)?,
    })
}

pub(crate) fn map_tally_row(row: &SqliteRow) -> Result<CategoryTally, StorageError> {
    Ok(CategoryTally::new(
        row.try_get::<String, _>("category").map_err(ser)?,
        i64_to_u64("total", row.try_get::<i64, _>("total").map_err(ser)?)?,
        i64_to_u64("correct", row.try_get::<i64, _>("correct").map_err(ser)?)?,
    ))
}
