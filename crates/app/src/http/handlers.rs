use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use tower_cookies::Cookies;

use quiz_core::model::{ExamSeries, Question, QuestionFilter, QuestionId, QuizMode};
use services::{AnswerCheck, DashboardStats};

use super::AppState;
use super::error::{ApiError, DashboardError};
use super::payload::{Ack, CheckQuery, QuestionsQuery, RecordRequest};
use super::session::current_session;

const INDEX_HTML: &str = include_str!("../../assets/index.html");
const DASHBOARD_HTML: &str = include_str!("../../assets/dashboard.html");

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn dashboard_page() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

pub async fn fallback() -> (StatusCode, Html<&'static str>) {
    (StatusCode::NOT_FOUND, Html("<h1>404 Not Found</h1>"))
}

/// Blank parameters count as absent; unknown exam series do not restrict.
fn build_filter(query: &QuestionsQuery) -> QuestionFilter {
    let mut filter = QuestionFilter {
        mode: QuizMode::from_param(query.mode.as_deref()),
        ..QuestionFilter::default()
    };
    if let Some(series) = query.exam_series.as_deref().and_then(ExamSeries::parse) {
        filter = filter.with_exam_series(series);
    }
    if let Some(category) = query.category.as_deref().filter(|c| !c.trim().is_empty()) {
        filter = filter.with_category(category);
    }
    filter
}

#[tracing::instrument(skip_all)]
pub async fn list_questions(
    State(state): State<AppState>,
    query: Result<Query<QuestionsQuery>, QueryRejection>,
) -> Result<Json<Vec<Question>>, ApiError> {
    let Query(query) = query?;
    let filter = build_filter(&query);
    Ok(Json(state.services.quiz().list_questions(&filter).await?))
}

#[tracing::instrument(skip_all)]
pub async fn record_outcome(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Ack>, ApiError> {
    let request = RecordRequest::from_slice(&body).inspect_err(|err| {
        tracing::warn!(error = %err, "rejected record body");
    })?;
    state
        .services
        .history()
        .record(request.question_id, request.is_correct)
        .await?;
    Ok(Json(Ack::OK))
}

#[tracing::instrument(skip_all)]
pub async fn check_answer(
    State(state): State<AppState>,
    cookies: Cookies,
    path: Result<Path<QuestionId>, PathRejection>,
    query: Result<Query<CheckQuery>, QueryRejection>,
) -> Result<Json<AnswerCheck>, ApiError> {
    let Path(id) = path?;
    let Query(CheckQuery { answer }) = query?;

    let session = current_session(&cookies);
    let sessions = state.services.sessions();
    let check = state
        .services
        .quiz()
        .check_answer(sessions.as_ref(), session, id, &answer)
        .await?;

    Ok(Json(check))
}

#[tracing::instrument(skip_all)]
pub async fn start_quiz(State(state): State<AppState>, cookies: Cookies) -> Json<Ack> {
    let session = current_session(&cookies);
    state.services.sessions().reset(&session);
    tracing::debug!(%session, "reset combo");
    Json(Ack::OK)
}

#[tracing::instrument(skip_all)]
pub async fn dashboard_stats(
    State(state): State<AppState>,
) -> Result<Json<DashboardStats>, DashboardError> {
    Ok(Json(state.services.stats().dashboard().await?))
}
