use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Duration;
use http_body_util::BodyExt;
use quiz_app::http::{AppState, router};
use quiz_core::model::{
    HistoryEntry, HistoryId, NewHistoryEntry, NewQuestion, Question, QuestionFilter, QuestionId,
};
use quiz_core::stats::CategoryTally;
use quiz_core::time::fixed_clock;
use serde_json::{Value, json};
use services::AppServices;
use storage::repository::{
    HistoryRepository, InMemoryRepository, QuestionRepository, Storage, StorageError,
};
use tower::ServiceExt;

async fn app_over(storage: &Storage) -> Router {
    let services = AppServices::from_storage(storage, fixed_clock(), Duration::hours(3));
    services.import().seed_samples().await.unwrap();
    router(AppState::new(services))
}

async fn app() -> Router {
    app_over(&Storage::in_memory()).await
}

/// Hands control back to the runtime before every lookup so concurrent
/// requests interleave.
struct YieldingQuestions(InMemoryRepository);

#[async_trait]
impl QuestionRepository for YieldingQuestions {
    async fn list_questions(&self, filter: &QuestionFilter) -> Result<Vec<Question>, StorageError> {
        self.0.list_questions(filter).await
    }

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError> {
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        self.0.get_question(id).await
    }

    async fn insert_question(&self, question: &NewQuestion) -> Result<QuestionId, StorageError> {
        self.0.insert_question(question).await
    }

    async fn replace_all(&self, questions: &[NewQuestion]) -> Result<u64, StorageError> {
        self.0.replace_all(questions).await
    }

    async fn count_questions(&self) -> Result<u64, StorageError> {
        self.0.count_questions().await
    }
}

/// Storage whose every call fails.
struct Offline;

fn offline() -> StorageError {
    StorageError::Connection("database is offline".into())
}

#[async_trait]
impl QuestionRepository for Offline {
    async fn list_questions(&self, _: &QuestionFilter) -> Result<Vec<Question>, StorageError> {
        Err(offline())
    }

    async fn get_question(&self, _: QuestionId) -> Result<Option<Question>, StorageError> {
        Err(offline())
    }

    async fn insert_question(&self, _: &NewQuestion) -> Result<QuestionId, StorageError> {
        Err(offline())
    }

    async fn replace_all(&self, _: &[NewQuestion]) -> Result<u64, StorageError> {
        Err(offline())
    }

    async fn count_questions(&self) -> Result<u64, StorageError> {
        Err(offline())
    }
}

#[async_trait]
impl HistoryRepository for Offline {
    async fn append_entry(&self, _: &NewHistoryEntry) -> Result<HistoryId, StorageError> {
        Err(offline())
    }

    async fn entries_for_question(&self, _: QuestionId) -> Result<Vec<HistoryEntry>, StorageError> {
        Err(offline())
    }

    async fn category_tallies(&self) -> Result<Vec<CategoryTally>, StorageError> {
        Err(offline())
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let cookie = res
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_owned);
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, cookie, body)
}

fn encode(raw: &str) -> String {
    raw.bytes().map(|b| format!("%{b:02X}")).collect()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut req = Request::get(uri);
    if let Some(cookie) = cookie {
        req = req.header(header::COOKIE, cookie);
    }
    req.body(Body::empty()).unwrap()
}

fn post(uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
    let mut req = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        req = req.header(header::COOKIE, cookie);
    }
    req.body(Body::from(body.to_string())).unwrap()
}

async fn question_ids(app: &Router, query: &str) -> Vec<u64> {
    let (status, _, body) = send(app, get(&format!("/api/questions{query}"), None)).await;
    assert_eq!(status, StatusCode::OK);
    body.as_array()
        .unwrap()
        .iter()
        .map(|q| q["id"].as_u64().unwrap())
        .collect()
}

#[tokio::test]
async fn pages_are_served() {
    let app = app().await;
    for uri in ["/", "/dashboard"] {
        let res = app.clone().oneshot(get(uri, None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let content_type = res.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/html"));
    }
    let res = app.clone().oneshot(get("/nope", None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn questions_filter_by_series_and_category() {
    let app = app().await;
    assert_eq!(question_ids(&app, "").await, vec![1, 2, 3]);
    assert_eq!(question_ids(&app, "?exam_series=past").await.len(), 3);
    assert!(question_ids(&app, "?exam_series=ai").await.is_empty());
    assert_eq!(question_ids(&app, "?exam_series=unknown").await.len(), 3);

    let query = format!(
        "?exam_series={}&category={}",
        encode("第52回"),
        encode("著作権法（公衆送信権）")
    );
    let ids = question_ids(&app, &query).await;
    assert_eq!(ids, vec![2]);

    let (_, _, body) = send(&app, get("/api/questions?category=", None)).await;
    let first = &body[0];
    assert_eq!(first["correct_answer"], "ウ");
    assert_eq!(first["scenario"], Value::Null);
    assert_eq!(body[2]["option_a"].as_str().unwrap().chars().next(), Some('「'));
}

#[tokio::test]
async fn check_tracks_combo_per_session_cookie() {
    let app = app().await;

    let (status, cookie, body) = send(&app, get(&format!("/api/check/1?answer={}", encode("ウ")), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_correct"], true);
    assert_eq!(body["combo"], 1);
    assert_eq!(body["title"], Value::Null);
    let cookie = cookie.expect("session cookie issued");
    assert!(cookie.starts_with("quiz_session="));

    let (_, _, body) = send(&app, get("/api/check/1?answer=C", Some(&cookie))).await;
    assert_eq!(body["combo"], 2);

    // A different client starts its own streak.
    let (_, _, other) = send(&app, get("/api/check/1?answer=C", None)).await;
    assert_eq!(other["combo"], 1);

    let (_, _, body) = send(&app, get(&format!("/api/check/1?answer={}", encode("ア")), Some(&cookie))).await;
    assert_eq!(body["is_correct"], false);
    assert_eq!(body["combo"], 0);
    assert_eq!(body["correct_answer"], "ウ");
    assert!(body["explanation"].as_str().unwrap().contains("第35条"));
}

#[tokio::test]
async fn combo_reaches_first_title_and_start_resets_it() {
    let app = app().await;
    let (_, cookie, _) = send(&app, get("/api/check/2?answer=B", None)).await;
    let cookie = cookie.unwrap();
    let mut last = Value::Null;
    for _ in 0..4 {
        last = send(&app, get("/api/check/2?answer=B", Some(&cookie))).await.2;
    }
    assert_eq!(last["combo"], 5);
    assert_eq!(last["title"], "駆け出し知財担当");

    let (status, _, body) = send(&app, post("/api/quiz/start", json!({}), Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));

    let (_, _, body) = send(&app, get("/api/check/2?answer=B", Some(&cookie))).await;
    assert_eq!(body["combo"], 1);
}

#[tokio::test]
async fn check_rejects_bad_input() {
    let app = app().await;

    let (status, _, body) = send(&app, get("/api/check/99?answer=A", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, _, body) = send(&app, get("/api/check/abc?answer=A", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_data");

    let (status, _, body) = send(&app, get("/api/check/1", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_data");
}

#[tokio::test]
async fn record_feeds_review_and_dashboard() {
    let app = app().await;

    for (id, correct) in [(json!(1), true), (json!("2"), false), (json!(2), true), (json!(3), false)] {
        let (status, _, body) = send(
            &app,
            post("/api/record", json!({"question_id": id, "is_correct": correct}), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true}));
    }

    assert_eq!(question_ids(&app, "?mode=review").await, vec![3]);

    let (status, _, stats) = send(&app, get("/api/dashboard/stats", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        stats,
        json!({
            "labels": ["特許法（侵害・訴訟）", "特許法（職務発明）", "著作権法（公衆送信権）"],
            "data": [0, 100, 50],
        })
    );
}

#[tokio::test]
async fn record_rejects_bad_bodies() {
    let app = app().await;

    for body in [
        json!({"question_id": 1}),
        json!({"is_correct": true}),
        json!({"question_id": "one", "is_correct": true}),
    ] {
        let (status, _, err) = send(&app, post("/api/record", body, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"], "invalid_data");
    }

    let (status, _, err) = send(
        &app,
        post("/api/record", json!({"question_id": 404, "is_correct": true}), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error"], "not_found");
}

#[tokio::test]
async fn dashboard_is_empty_without_history() {
    let app = app().await;
    let (_, _, stats) = send(&app, get("/api/dashboard/stats", None)).await;
    assert_eq!(stats, json!({"labels": [], "data": []}));
}

#[tokio::test]
async fn concurrent_checks_in_one_session_each_extend_the_combo() {
    let repo = InMemoryRepository::new();
    let storage = Storage {
        questions: Arc::new(YieldingQuestions(repo.clone())),
        history: Arc::new(repo),
    };
    let app = app_over(&storage).await;

    let (_, cookie, first) = send(&app, get("/api/check/2?answer=B", None)).await;
    assert_eq!(first["combo"], 1);
    let cookie = cookie.unwrap();

    let (a, b) = tokio::join!(
        send(&app, get("/api/check/2?answer=B", Some(&cookie))),
        send(&app, get("/api/check/2?answer=B", Some(&cookie))),
    );
    let mut combos = [a.2["combo"].as_u64().unwrap(), b.2["combo"].as_u64().unwrap()];
    combos.sort_unstable();
    assert_eq!(combos, [2, 3]);

    let (_, _, last) = send(&app, get("/api/check/2?answer=B", Some(&cookie))).await;
    assert_eq!(last["combo"], 4);
}

#[tokio::test]
async fn storage_failures_return_database_error() {
    let storage = Storage {
        questions: Arc::new(Offline),
        history: Arc::new(Offline),
    };
    let services = AppServices::from_storage(&storage, fixed_clock(), Duration::hours(3));
    let app = router(AppState::new(services));
    let expected = json!({
        "error": "database_error",
        "message": "データベースの処理に失敗しました。",
    });

    for req in [
        get("/api/questions", None),
        get("/api/check/1?answer=A", None),
        post("/api/record", json!({"question_id": 1, "is_correct": true}), None),
    ] {
        let (status, _, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, expected);
    }

    let (status, _, body) = send(&app, get("/api/dashboard/stats", None)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "database_error");
    assert_eq!(body["message"], expected["message"]);
    assert_eq!(body["labels"], json!([]));
    assert_eq!(body["data"], json!([]));
}
