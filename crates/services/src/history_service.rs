use std::sync::Arc;

use quiz_core::model::{HistoryEntry, NewHistoryEntry, QuestionId};
use storage::repository::{HistoryRepository, QuestionRepository, StorageError};

use crate::Clock;
use crate::error::HistoryServiceError;

/// Appends answer outcomes to the history log.
#[derive(Clone)]
pub struct HistoryService {
    clock: Clock,
    questions: Arc<dyn QuestionRepository>,
    history: Arc<dyn HistoryRepository>,
}

impl HistoryService {
    #[must_use]
    pub fn new(
        clock: Clock,
        questions: Arc<dyn QuestionRepository>,
        history: Arc<dyn HistoryRepository>,
    ) -> Self {
        Self {
            clock,
            questions,
            history,
        }
    }

    /// Record one outcome, timestamped with the service clock.
    ///
    /// Recording is unconditional: repeated calls append repeated entries.
    ///
    /// # Errors
    ///
    /// Returns `HistoryServiceError::UnknownQuestion` if the question does not
    /// exist, or `HistoryServiceError::Storage` if persistence fails.
    pub async fn record(
        &self,
        question_id: QuestionId,
        is_correct: bool,
    ) -> Result<HistoryEntry, HistoryServiceError> {
        if self.questions.get_question(question_id).await?.is_none() {
            return Err(HistoryServiceError::UnknownQuestion(question_id));
        }

        let entry = NewHistoryEntry::new(question_id, is_correct, self.clock.now());
        // The question can disappear between the check and the insert during a reload.
        let id = self.history.append_entry(&entry).await.map_err(|e| match e {
            StorageError::Conflict => HistoryServiceError::UnknownQuestion(question_id),
            other => HistoryServiceError::Storage(other),
        })?;

        tracing::info!(question_id = %question_id, is_correct, history_id = %id, "recorded outcome");
        Ok(entry.assign_id(id))
    }

    /// Entries for one question, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `HistoryServiceError::Storage` if repository access fails.
    pub async fn entries_for(
        &self,
        question_id: QuestionId,
    ) -> Result<Vec<HistoryEntry>, HistoryServiceError> {
        Ok(self.history.entries_for_question(question_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuestionDraft;
    use quiz_core::time::{fixed_clock, fixed_now};
    use storage::repository::InMemoryRepository;

    async fn setup() -> (HistoryService, QuestionId) {
        let repo = InMemoryRepository::new();
        let id = repo
            .insert_question(
                &QuestionDraft {
                    exam_type: "AI模擬".into(),
                    category: "商標法".into(),
                    question_text: "Q".into(),
                    correct_answer: "ア".into(),
                    ..QuestionDraft::default()
                }
                .validate()
                .unwrap(),
            )
            .await
            .unwrap();
        let repo = Arc::new(repo);
        (HistoryService::new(fixed_clock(), repo.clone(), repo), id)
    }

    #[tokio::test]
    async fn record_appends_with_clock_timestamp() {
        let (service, id) = setup().await;
        let entry = service.record(id, false).await.unwrap();
        assert_eq!(entry.question_id, id);
        assert!(!entry.is_correct);
        assert_eq!(entry.answered_at, fixed_now());
    }

    #[tokio::test]
    async fn duplicate_records_are_kept() {
        let (service, id) = setup().await;
        service.record(id, true).await.unwrap();
        service.record(id, true).await.unwrap();
        assert_eq!(service.entries_for(id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_question_is_rejected() {
        let (service, _) = setup().await;
        let err = service.record(QuestionId::new(99), true).await.unwrap_err();
        assert!(matches!(err, HistoryServiceError::UnknownQuestion(_)));
    }
}
