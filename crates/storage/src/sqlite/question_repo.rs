use quiz_core::model::{
    ExamTypeCriterion, NewQuestion, Question, QuestionFilter, QuestionId, QuizMode,
};
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor};

use super::{
    SqliteRepository,
    mapping::{db_err, id_to_i64, map_question_row, question_id_from_i64},
};
use crate::repository::{QuestionRepository, StorageError};

const QUESTION_COLUMNS: &str = "q.id, q.exam_type, q.category, q.scenario, q.question_text, \
     q.option_a, q.option_b, q.option_c, q.option_d, q.correct_answer, q.explanation";

/// Appends the exam-series and category criteria to a `WHERE` clause.
fn push_column_filters<'a>(qb: &mut QueryBuilder<'a, Sqlite>, filter: &'a QuestionFilter) {
    if let Some(series) = filter.exam_series {
        match series.criterion() {
            ExamTypeCriterion::AnyPrefix(prefixes) => {
                qb.push(" AND (");
                for (i, prefix) in prefixes.into_iter().enumerate() {
                    if i > 0 {
                        qb.push(" OR ");
                    }
                    qb.push("q.exam_type LIKE ");
                    qb.push_bind(format!("{prefix}%"));
                }
                qb.push(")");
            }
            ExamTypeCriterion::Exact(value) => {
                qb.push(" AND q.exam_type = ");
                qb.push_bind(value);
            }
        }
    }
    if let Some(category) = filter.category.as_deref() {
        qb.push(" AND q.category = ");
        qb.push_bind(category);
    }
}

async fn insert_one<'e, E>(executor: E, question: &NewQuestion) -> Result<QuestionId, StorageError>
where
    E: SqliteExecutor<'e>,
{
    let res = sqlx::query(
        r"
            INSERT INTO questions (
                exam_type, category, scenario, question_text,
                option_a, option_b, option_c, option_d,
                correct_answer, explanation
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ",
    )
    .bind(question.exam_type.clone())
    .bind(question.category.clone())
    .bind(question.scenario.clone())
    .bind(question.question_text.clone())
    .bind(question.option_a.clone())
    .bind(question.option_b.clone())
    .bind(question.option_c.clone())
    .bind(question.option_d.clone())
    .bind(question.correct_answer.clone())
    .bind(question.explanation.clone())
    .execute(executor)
    .await
    .map_err(db_err)?;

    question_id_from_i64(res.last_insert_rowid())
}

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn list_questions(
        &self,
        filter: &QuestionFilter,
    ) -> Result<Vec<Question>, StorageError> {
        let mut qb: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new(format!("SELECT {QUESTION_COLUMNS} FROM questions q"));

        match filter.mode {
            QuizMode::All => {
                qb.push(" WHERE 1 = 1");
            }
            QuizMode::Review => {
                // Latest entry per question: greatest answered_at, then greatest id.
                qb.push(
                    r"
                    JOIN history h ON h.question_id = q.id
                    WHERE h.id = (
                        SELECT h2.id FROM history h2
                        WHERE h2.question_id = q.id
                        ORDER BY h2.answered_at DESC, h2.id DESC
                        LIMIT 1
                    )
                    AND h.is_correct = 0",
                );
            }
        }

        push_column_filters(&mut qb, filter);
        qb.push(" ORDER BY q.id ASC");

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_question_row(&row)?);
        }
        Ok(out)
    }

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions q WHERE q.id = ?1"
        ))
        .bind(id_to_i64("question_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(map_question_row).transpose()
    }

    async fn insert_question(&self, question: &NewQuestion) -> Result<QuestionId, StorageError> {
        insert_one(&self.pool, question).await
    }

    async fn replace_all(&self, questions: &[NewQuestion]) -> Result<u64, StorageError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let deleted = sqlx::query("DELETE FROM questions")
            .execute(&mut *tx)
            .await
            .map_err(db_err)?
            .rows_affected();

        for question in questions {
            insert_one(&mut *tx, question).await?;
        }

        tx.commit().await.map_err(db_err)?;

        tracing::info!(
            deleted,
            inserted = questions.len(),
            "replaced question table"
        );
        Ok(questions.len() as u64)
    }

    async fn count_questions(&self) -> Result<u64, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        u64::try_from(count).map_err(|_| StorageError::Serialization("count sign overflow".into()))
    }
}
