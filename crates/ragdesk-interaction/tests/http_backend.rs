//! HttpBackend against an in-process fake backend.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use ragdesk_core::QueryError;
use ragdesk_core::session::{
    MessageRole, QaBackend, QueryKind, QueryMode, QueryRequest, Settings, TranscriptEntry,
};
use ragdesk_interaction::HttpBackend;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Default)]
struct Recorder {
    calls: Arc<Mutex<Vec<(&'static str, String)>>>,
}

impl Recorder {
    fn push(&self, path: &'static str, body: String) {
        self.calls.lock().unwrap().push((path, body));
    }

    fn calls(&self) -> Vec<(&'static str, String)> {
        self.calls.lock().unwrap().clone()
    }
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn backend(url: &str) -> HttpBackend {
    HttpBackend::new(url, Duration::from_secs(5), Duration::from_secs(5)).unwrap()
}

fn request<'a>(question: &'a str, history: Vec<TranscriptEntry<'a>>) -> QueryRequest<'a> {
    QueryRequest {
        question,
        chat_history: history,
        mode: QueryMode::Sql,
        model: Some("llama3:70b"),
    }
}

fn healthy_router(recorder: Recorder) -> Router {
    Router::new()
        .route(
            "/query",
            post(|State(rec): State<Recorder>, body: String| async move {
                rec.push("/query", body);
                Json(json!({
                    "answer": "$1.2M",
                    "sql_query": "SELECT SUM(amount) FROM sales WHERE quarter = 'Q1'",
                    "data": [{"quarter": "Q1", "total": 1200000}]
                }))
            }),
        )
        .route(
            "/reset",
            post(|State(rec): State<Recorder>, body: String| async move {
                rec.push("/reset", body);
                StatusCode::OK
            }),
        )
        .route(
            "/config",
            post(|State(rec): State<Recorder>, body: String| async move {
                rec.push("/config", body);
                Json(json!({"status": "ok"}))
            }),
        )
        .with_state(recorder)
}

#[tokio::test]
async fn test_query_success_sends_contract_body() {
    let recorder = Recorder::default();
    let url = serve(healthy_router(recorder.clone())).await;

    let history = vec![
        TranscriptEntry {
            role: MessageRole::User,
            content: "hello",
        },
        TranscriptEntry {
            role: MessageRole::Assistant,
            content: "Hi, ask me about sales.",
        },
    ];
    let answer = backend(&url)
        .query(&request("What were Q1 sales?", history))
        .await
        .expect("query should succeed");

    assert_eq!(answer.answer, "$1.2M");
    let query = answer.metadata.query.expect("generated query");
    assert_eq!(query.kind, QueryKind::Sql);
    assert!(answer.metadata.data.is_some());

    let calls = recorder.calls();
    assert_eq!(calls.len(), 1);
    let sent: Value = serde_json::from_str(&calls[0].1).unwrap();
    assert_eq!(
        sent,
        json!({
            "question": "What were Q1 sales?",
            "chat_history": [
                {"role": "user", "content": "hello"},
                {"role": "assistant", "content": "Hi, ask me about sales."}
            ],
            "mode": "sql",
            "model": "llama3:70b"
        })
    );
}

#[tokio::test]
async fn test_non_200_is_backend_status() {
    let router = Router::new().route(
        "/query",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model crashed") }),
    );
    let url = serve(router).await;

    let err = backend(&url)
        .query(&request("q", Vec::new()))
        .await
        .unwrap_err();
    assert_eq!(err, QueryError::BackendStatus(500));
}

#[tokio::test]
async fn test_other_2xx_is_backend_status() {
    let router = Router::new().route("/query", post(|| async { StatusCode::ACCEPTED }));
    let url = serve(router).await;

    let err = backend(&url)
        .query(&request("q", Vec::new()))
        .await
        .unwrap_err();
    assert_eq!(err, QueryError::BackendStatus(202));
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let router = Router::new().route("/query", post(|| async { "<html>tunnel offline</html>" }));
    let url = serve(router).await;

    let err = backend(&url)
        .query(&request("q", Vec::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let router = Router::new().route(
        "/query",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(json!({"answer": "too late"}))
        }),
    );
    let url = serve(router).await;

    let backend =
        HttpBackend::new(&url, Duration::from_millis(200), Duration::from_secs(5)).unwrap();
    let err = backend
        .query(&request("q", Vec::new()))
        .await
        .unwrap_err();
    assert_eq!(err, QueryError::Timeout);
}

#[tokio::test]
async fn test_unreachable_backend_is_connection_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = backend(&format!("http://{}", addr))
        .query(&request("q", Vec::new()))
        .await
        .unwrap_err();
    assert_eq!(err, QueryError::Connection);
}

#[tokio::test]
async fn test_reset_posts_empty_body() {
    let recorder = Recorder::default();
    let url = serve(healthy_router(recorder.clone())).await;

    backend(&url).reset().await.expect("reset should succeed");

    let calls = recorder.calls();
    assert_eq!(calls, vec![("/reset", String::new())]);
}

#[tokio::test]
async fn test_reset_failure_is_reported() {
    let router = Router::new().route("/reset", post(|| async { StatusCode::SERVICE_UNAVAILABLE }));
    let url = serve(router).await;

    let err = backend(&url).reset().await.unwrap_err();
    assert_eq!(err, QueryError::BackendStatus(503));
}

#[tokio::test]
async fn test_apply_config_sends_settings() {
    let recorder = Recorder::default();
    let url = serve(healthy_router(recorder.clone())).await;

    backend(&url)
        .apply_config(&Settings::new(QueryMode::Python, Some("mixtral:8x7b".into())))
        .await
        .expect("config should succeed");

    let calls = recorder.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "/config");
    let sent: Value = serde_json::from_str(&calls[0].1).unwrap();
    assert_eq!(sent, json!({"mode": "python", "model": "mixtral:8x7b"}));
}

#[tokio::test]
async fn test_apply_config_rejected() {
    let router = Router::new().route(
        "/config",
        post(|| async { (StatusCode::BAD_REQUEST, "unknown model") }),
    );
    let url = serve(router).await;

    let err = backend(&url)
        .apply_config(&Settings::new(QueryMode::Rag, None))
        .await
        .unwrap_err();
    assert_eq!(err, QueryError::BackendStatus(400));
}
