use std::sync::Arc;

use serde::Serialize;

use quiz_core::combo::ComboTracker;
use quiz_core::model::{Question, QuestionFilter, QuestionId, SessionId};
use storage::repository::QuestionRepository;

use crate::error::QuizServiceError;
use crate::sessions::SessionStore;

/// Outcome of grading one answer, before any session state is involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grading {
    pub correct_answer: String,
    pub explanation: Option<String>,
    pub is_correct: bool,
}

impl Grading {
    /// Attach the session streak that resulted from this grading.
    #[must_use]
    pub fn with_combo(self, combo: ComboTracker) -> AnswerCheck {
        AnswerCheck {
            correct_answer: self.correct_answer,
            explanation: self.explanation,
            is_correct: self.is_correct,
            combo: combo.count(),
            title: combo.title(),
        }
    }
}

/// Result of checking one submitted answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerCheck {
    pub correct_answer: String,
    pub explanation: Option<String>,
    pub is_correct: bool,
    pub combo: u32,
    pub title: Option<&'static str>,
}

/// Reads questions and grades answers.
#[derive(Clone)]
pub struct QuizService {
    questions: Arc<dyn QuestionRepository>,
}

impl QuizService {
    #[must_use]
    pub fn new(questions: Arc<dyn QuestionRepository>) -> Self {
        Self { questions }
    }

    /// List questions matching the filter, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if repository access fails.
    pub async fn list_questions(
        &self,
        filter: &QuestionFilter,
    ) -> Result<Vec<Question>, QuizServiceError> {
        let questions = self.questions.list_questions(filter).await?;
        tracing::debug!(?filter, count = questions.len(), "listed questions");
        Ok(questions)
    }

    /// Fetch a single question.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::NotFound` for an unknown id, or
    /// `QuizServiceError::Storage` if repository access fails.
    pub async fn get_question(&self, id: QuestionId) -> Result<Question, QuizServiceError> {
        self.questions
            .get_question(id)
            .await?
            .ok_or(QuizServiceError::NotFound(id))
    }

    /// Grade `submitted` against the stored answer without touching any session.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::NotFound` for an unknown id, or
    /// `QuizServiceError::Storage` if repository access fails.
    pub async fn grade(
        &self,
        id: QuestionId,
        submitted: &str,
    ) -> Result<Grading, QuizServiceError> {
        let question = self.get_question(id).await?;
        let is_correct = question.is_correct(submitted);
        Ok(Grading {
            correct_answer: question.correct_answer,
            explanation: question.explanation,
            is_correct,
        })
    }

    /// Grade `submitted` and apply the result to the session's combo.
    ///
    /// The session is only touched once the question is known to exist.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::NotFound` for an unknown id, or
    /// `QuizServiceError::Storage` if repository access fails.
    pub async fn check_answer(
        &self,
        sessions: &dyn SessionStore,
        session: SessionId,
        id: QuestionId,
        submitted: &str,
    ) -> Result<AnswerCheck, QuizServiceError> {
        let grading = self.grade(id, submitted).await?;
        let combo = sessions.record(session, grading.is_correct);

        tracing::debug!(
            question_id = %id,
            is_correct = grading.is_correct,
            combo = combo.count(),
            "checked answer"
        );

        Ok(grading.with_combo(combo))
    }
}
