//! HTTP surface: page shells and the JSON API.

use axum::Router;
use axum::routing::{get, post};
use tower_cookies::CookieManagerLayer;

use services::AppServices;

pub mod error;
pub mod handlers;
pub mod payload;
pub mod session;

pub use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub services: AppServices,
}

impl AppState {
    #[must_use]
    pub fn new(services: AppServices) -> Self {
        Self { services }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/dashboard", get(handlers::dashboard_page))
        .route("/api/questions", get(handlers::list_questions))
        .route("/api/record", post(handlers::record_outcome))
        .route("/api/check/{id}", get(handlers::check_answer))
        .route("/api/quiz/start", post(handlers::start_quiz))
        .route("/api/dashboard/stats", get(handlers::dashboard_stats))
        .fallback(handlers::fallback)
        .layer(CookieManagerLayer::new())
        .with_state(state)
}
