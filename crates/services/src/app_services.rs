use std::sync::Arc;

use chrono::Duration;

use storage::repository::Storage;

use crate::error::AppServicesError;
use crate::history_service::HistoryService;
use crate::import_service::ImportService;
use crate::quiz_service::QuizService;
use crate::sessions::{InMemorySessionStore, SessionStore};
use crate::stats_service::StatsService;
use crate::Clock;

/// Assembles the app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    quiz: Arc<QuizService>,
    history: Arc<HistoryService>,
    stats: Arc<StatsService>,
    import: Arc<ImportService>,
    sessions: Arc<dyn SessionStore>,
}

impl AppServices {
    /// Build services over an already initialized storage backend.
    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, session_ttl: Duration) -> Self {
        let quiz = Arc::new(QuizService::new(Arc::clone(&storage.questions)));
        let history = Arc::new(HistoryService::new(
            clock,
            Arc::clone(&storage.questions),
            Arc::clone(&storage.history),
        ));
        let stats = Arc::new(StatsService::new(Arc::clone(&storage.history)));
        let import = Arc::new(ImportService::new(Arc::clone(&storage.questions)));
        let sessions: Arc<dyn SessionStore> =
            Arc::new(InMemorySessionStore::new(clock, session_ttl));

        Self {
            quiz,
            history,
            stats,
            import,
            sessions,
        }
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        session_ttl: Duration,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;

        let questions = storage.questions.count_questions().await?;
        if questions == 0 {
            tracing::warn!("question table is empty; run `quiz import` or `quiz seed`");
        } else {
            tracing::info!(questions, "opened question store");
        }

        Ok(Self::from_storage(&storage, clock, session_ttl))
    }

    #[must_use]
    pub fn quiz(&self) -> Arc<QuizService> {
        Arc::clone(&self.quiz)
    }

    #[must_use]
    pub fn history(&self) -> Arc<HistoryService> {
        Arc::clone(&self.history)
    }

    #[must_use]
    pub fn stats(&self) -> Arc<StatsService> {
        Arc::clone(&self.stats)
    }

    #[must_use]
    pub fn import(&self) -> Arc<ImportService> {
        Arc::clone(&self.import)
    }

    #[must_use]
    pub fn sessions(&self) -> Arc<dyn SessionStore> {
        Arc::clone(&self.sessions)
    }
}
