use async_trait::async_trait;
use quiz_core::model::{
    HistoryEntry, HistoryId, NewHistoryEntry, NewQuestion, Question, QuestionFilter, QuestionId,
    QuizMode, latest_outcomes,
};
use quiz_core::stats::CategoryTally;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    /// A write violated a constraint, e.g. history for a missing question.
    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for the question table.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// List questions matching the filter, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn list_questions(&self, filter: &QuestionFilter)
    -> Result<Vec<Question>, StorageError>;

    /// Fetch a question by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails; a missing row is `Ok(None)`.
    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError>;

    /// Insert a single question and return its new id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the row cannot be stored.
    async fn insert_question(&self, question: &NewQuestion) -> Result<QuestionId, StorageError>;

    /// Delete every question (and, through the foreign key, its history) and
    /// insert `questions` in order, atomically. Returns the number inserted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if any statement fails; nothing is changed then.
    async fn replace_all(&self, questions: &[NewQuestion]) -> Result<u64, StorageError>;

    /// Number of stored questions.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn count_questions(&self) -> Result<u64, StorageError>;
}

/// Repository contract for the append-only history log.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Append an outcome and return the new entry id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the question does not exist, or
    /// other storage errors.
    async fn append_entry(&self, entry: &NewHistoryEntry) -> Result<HistoryId, StorageError>;

    /// All entries for one question, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn entries_for_question(
        &self,
        question_id: QuestionId,
    ) -> Result<Vec<HistoryEntry>, StorageError>;

    /// Attempts and correct answers grouped by question category, ordered by
    /// category. Categories without attempts are omitted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn category_tallies(&self) -> Result<Vec<CategoryTally>, StorageError>;
}

#[derive(Default)]
struct MemoryState {
    questions: BTreeMap<QuestionId, Question>,
    history: Vec<HistoryEntry>,
    last_question_id: u64,
    last_history_id: u64,
}

impl MemoryState {
    fn insert(&mut self, question: &NewQuestion) -> QuestionId {
        self.last_question_id += 1;
        let id = QuestionId::new(self.last_question_id);
        self.questions.insert(id, question.clone().assign_id(id));
        id
    }
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// Ids are never reused, matching `AUTOINCREMENT` in the `SQLite` schema.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn list_questions(
        &self,
        filter: &QuestionFilter,
    ) -> Result<Vec<Question>, StorageError> {
        let guard = self.lock()?;
        let missed: Option<HashSet<QuestionId>> = match filter.mode {
            QuizMode::All => None,
            QuizMode::Review => Some(
                latest_outcomes(&guard.history)
                    .into_iter()
                    .filter_map(|(id, correct)| (!correct).then_some(id))
                    .collect(),
            ),
        };

        Ok(guard
            .questions
            .values()
            .filter(|q| missed.as_ref().is_none_or(|ids| ids.contains(&q.id)))
            .filter(|q| filter.matches_columns(q))
            .cloned()
            .collect())
    }

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.questions.get(&id).cloned())
    }

    async fn insert_question(&self, question: &NewQuestion) -> Result<QuestionId, StorageError> {
        let mut guard = self.lock()?;
        Ok(guard.insert(question))
    }

    async fn replace_all(&self, questions: &[NewQuestion]) -> Result<u64, StorageError> {
        let mut guard = self.lock()?;
        guard.questions.clear();
        guard.history.clear();
        for question in questions {
            guard.insert(question);
        }
        Ok(questions.len() as u64)
    }

    async fn count_questions(&self) -> Result<u64, StorageError> {
        let guard = self.lock()?;
        Ok(guard.questions.len() as u64)
    }
}

#[async_trait]
impl HistoryRepository for InMemoryRepository {
    async fn append_entry(&self, entry: &NewHistoryEntry) -> Result<HistoryId, StorageError> {
        let mut guard = self.lock()?;
        if !guard.questions.contains_key(&entry.question_id) {
            return Err(StorageError::Conflict);
        }
        guard.last_history_id += 1;
        let id = HistoryId::new(guard.last_history_id);
        guard.history.push(entry.assign_id(id));
        Ok(id)
    }

    async fn entries_for_question(
        &self,
        question_id: QuestionId,
    ) -> Result<Vec<HistoryEntry>, StorageError> {
        let guard = self.lock()?;
        let mut entries: Vec<HistoryEntry> = guard
            .history
            .iter()
            .filter(|e| e.question_id == question_id)
            .copied()
            .collect();
        entries.sort_by_key(|e| (e.answered_at, e.id));
        Ok(entries)
    }

    async fn category_tallies(&self) -> Result<Vec<CategoryTally>, StorageError> {
        let guard = self.lock()?;
        let mut by_category: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
        for entry in &guard.history {
            let Some(question) = guard.questions.get(&entry.question_id) else {
                continue;
            };
            let slot = by_category.entry(question.category.as_str()).or_default();
            slot.0 += 1;
            if entry.is_correct {
                slot.1 += 1;
            }
        }
        Ok(by_category
            .into_iter()
            .map(|(category, (total, correct))| CategoryTally::new(category, total, correct))
            .collect())
    }
}

/// Aggregates question and history repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub history: Arc<dyn HistoryRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo.clone());
        let history: Arc<dyn HistoryRepository> = Arc::new(repo);
        Self { questions, history }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::{ExamSeries, QuestionDraft};
    use quiz_core::time::fixed_now;

    fn new_question(exam_type: &str, category: &str, text: &str) -> NewQuestion {
        QuestionDraft {
            exam_type: exam_type.into(),
            category: category.into(),
            question_text: text.into(),
            option_a: "a".into(),
            option_b: "b".into(),
            option_c: "c".into(),
            option_d: "d".into(),
            correct_answer: "ア".into(),
            ..QuestionDraft::default()
        }
        .validate()
        .unwrap()
    }

    #[tokio::test]
    async fn review_mode_uses_latest_outcome() {
        let repo = InMemoryRepository::new();
        let q1 = repo
            .insert_question(&new_question("第52回 学科", "特許法", "Q1"))
            .await
            .unwrap();
        let q2 = repo
            .insert_question(&new_question("第52回 学科", "特許法", "Q2"))
            .await
            .unwrap();
        repo.insert_question(&new_question("AI模擬", "特許法", "Q3"))
            .await
            .unwrap();

        let t0 = fixed_now();
        // q1: wrong then right -> not in review
        repo.append_entry(&NewHistoryEntry::new(q1, false, t0))
            .await
            .unwrap();
        repo.append_entry(&NewHistoryEntry::new(q1, true, t0 + Duration::seconds(1)))
            .await
            .unwrap();
        // q2: right then wrong -> in review
        repo.append_entry(&NewHistoryEntry::new(q2, true, t0))
            .await
            .unwrap();
        repo.append_entry(&NewHistoryEntry::new(q2, false, t0 + Duration::seconds(1)))
            .await
            .unwrap();

        let review = repo.list_questions(&QuestionFilter::review()).await.unwrap();
        let ids: Vec<_> = review.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![q2]);
    }

    #[tokio::test]
    async fn filters_intersect_series_and_category() {
        let repo = InMemoryRepository::new();
        let keep = repo
            .insert_question(&new_question("第51回 実技", "著作権法", "keep"))
            .await
            .unwrap();
        repo.insert_question(&new_question("第51回 実技", "特許法", "other category"))
            .await
            .unwrap();
        repo.insert_question(&new_question("AI模擬", "著作権法", "other series"))
            .await
            .unwrap();

        let filter = QuestionFilter::all()
            .with_exam_series(ExamSeries::Past)
            .with_category("著作権法");
        let listed = repo.list_questions(&filter).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, keep);
    }

    #[tokio::test]
    async fn history_for_unknown_question_conflicts() {
        let repo = InMemoryRepository::new();
        let err = repo
            .append_entry(&NewHistoryEntry::new(QuestionId::new(42), true, fixed_now()))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
    }

    #[tokio::test]
    async fn replace_all_drops_previous_rows_and_history() {
        let repo = InMemoryRepository::new();
        let old = repo
            .insert_question(&new_question("第50回 学科", "特許法", "old"))
            .await
            .unwrap();
        repo.append_entry(&NewHistoryEntry::new(old, false, fixed_now()))
            .await
            .unwrap();

        let inserted = repo
            .replace_all(&[new_question("AI模擬", "商標法", "new")])
            .await
            .unwrap();
        assert_eq!(inserted, 1);
        assert_eq!(repo.count_questions().await.unwrap(), 1);
        assert!(repo.get_question(old).await.unwrap().is_none());
        assert!(repo.category_tallies().await.unwrap().is_empty());

        let listed = repo.list_questions(&QuestionFilter::all()).await.unwrap();
        assert!(listed[0].id > old, "ids are not reused");
    }
}
