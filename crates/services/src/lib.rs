#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod history_service;
pub mod import_service;
pub mod quiz_service;
pub mod sessions;
pub mod stats_service;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use error::{
    AppServicesError, HistoryServiceError, ImportError, QuizServiceError, StatsServiceError,
};
pub use history_service::HistoryService;
pub use import_service::{ImportReport, ImportService, ImportSources, SourceReport};
pub use quiz_service::{AnswerCheck, Grading, QuizService};
pub use sessions::{InMemorySessionStore, SessionStore};
pub use stats_service::{DashboardStats, StatsService};
