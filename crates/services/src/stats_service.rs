use std::sync::Arc;

use serde::Serialize;

use quiz_core::stats::CategoryTally;
use storage::repository::HistoryRepository;

use crate::error::StatsServiceError;

/// Per-category accuracy as parallel label/value series for the radar chart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub labels: Vec<String>,
    pub data: Vec<u64>,
}

impl From<Vec<CategoryTally>> for DashboardStats {
    fn from(tallies: Vec<CategoryTally>) -> Self {
        let mut stats = Self::default();
        for tally in tallies.into_iter().filter(|t| t.total > 0) {
            stats.data.push(tally.percent());
            stats.labels.push(tally.category);
        }
        stats
    }
}

/// Aggregates the history log for the dashboard.
#[derive(Clone)]
pub struct StatsService {
    history: Arc<dyn HistoryRepository>,
}

impl StatsService {
    #[must_use]
    pub fn new(history: Arc<dyn HistoryRepository>) -> Self {
        Self { history }
    }

    /// Attempt tallies per category that has at least one attempt.
    ///
    /// # Errors
    ///
    /// Returns `StatsServiceError::Storage` if repository access fails.
    pub async fn category_tallies(&self) -> Result<Vec<CategoryTally>, StatsServiceError> {
        Ok(self.history.category_tallies().await?)
    }

    /// Rounded accuracy percentage per category, ordered by category.
    ///
    /// # Errors
    ///
    /// Returns `StatsServiceError::Storage` if repository access fails.
    pub async fn dashboard(&self) -> Result<DashboardStats, StatsServiceError> {
        let stats = DashboardStats::from(self.category_tallies().await?);
        tracing::debug!(categories = stats.labels.len(), "built dashboard stats");
        Ok(stats)
    }
}
