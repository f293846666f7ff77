use axum::Json;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use quiz_core::model::QuestionId;
use services::{DashboardStats, HistoryServiceError, QuizServiceError, StatsServiceError};

const DATABASE_MESSAGE: &str = "データベースの処理に失敗しました。";

/// Failure of an API request, rendered as `{"error": code, "message": text}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidData(String),
    #[error("question {0} not found")]
    NotFound(QuestionId),
    #[error("database error")]
    Database,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(flatten)]
    stats: Option<DashboardStats>,
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidData(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidData(_) => "invalid_data",
            Self::NotFound(_) => "not_found",
            Self::Database => "database_error",
        }
    }

    fn database(err: &dyn std::error::Error) -> Self {
        tracing::error!(error = %err, "storage failure");
        Self::Database
    }

    fn render(&self, stats: Option<DashboardStats>) -> Response {
        let message = match self {
            Self::Database => DATABASE_MESSAGE.to_owned(),
            other => other.to_string(),
        };
        let body = ErrorBody {
            error: self.code(),
            message,
            stats,
        };
        (self.status(), Json(body)).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.render(None)
    }
}

/// Dashboard failure; the body keeps empty `labels` and `data` so the chart
/// script can still draw.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct DashboardError(#[from] pub ApiError);

impl From<StatsServiceError> for DashboardError {
    fn from(err: StatsServiceError) -> Self {
        Self(ApiError::from(err))
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        self.0.render(Some(DashboardStats::default()))
    }
}

impl From<QuizServiceError> for ApiError {
    fn from(err: QuizServiceError) -> Self {
        match err {
            QuizServiceError::NotFound(id) => Self::NotFound(id),
            other => Self::database(&other),
        }
    }
}

impl From<HistoryServiceError> for ApiError {
    fn from(err: HistoryServiceError) -> Self {
        match err {
            HistoryServiceError::UnknownQuestion(id) => Self::NotFound(id),
            other => Self::database(&other),
        }
    }
}

impl From<StatsServiceError> for ApiError {
    fn from(err: StatsServiceError) -> Self {
        Self::database(&err)
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::InvalidData(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidData(rejection.body_text())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidData(err.to_string())
    }
}
