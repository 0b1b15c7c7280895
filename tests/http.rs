//! HTTP-level tests: the real clients against in-process axum servers, and
//! the webhook router driven with `tower::ServiceExt::oneshot`.
//!
//!   cargo test --test http

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;
use vocab2post::pipeline::publish::basic_auth;
use vocab2post::server::{StatusResponse, INDEX_HTML};
use vocab2post::{
    build_router, CompletionBackend, DocumentFetcher, HttpFetcher, InlineDispatcher,
    JobDispatcher, MessagesBackend, Passage, Pipeline, Publisher, SpawnDispatcher, TextExtractor,
    Vocab2PostError, WordPressPublisher,
};
use tokio::sync::Notify;

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Serve `router` on an ephemeral local port and return its base URL.
async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    format!("http://{addr}")
}

/// Everything a mock endpoint saw: request headers and JSON body.
#[derive(Clone, Default)]
struct Seen(Arc<Mutex<Vec<(HeaderMap, Value)>>>);

impl Seen {
    fn requests(&self) -> Vec<(HeaderMap, Value)> {
        self.0.lock().unwrap().clone()
    }
}

fn fetcher(timeout_secs: u64) -> HttpFetcher {
    HttpFetcher {
        timeout_secs,
        user_agent: "Mozilla/5.0 (vocab2post test)".into(),
    }
}

fn messages_backend(endpoint: String) -> MessagesBackend {
    MessagesBackend {
        endpoint,
        api_key: "sk-test".into(),
        model: "test-model".into(),
        max_tokens: 512,
        timeout_secs: 5,
    }
}

fn wordpress(endpoint: String) -> WordPressPublisher {
    WordPressPublisher {
        endpoint,
        user: "editor".into(),
        app_password: "abcd efgh ijkl mnop".into(),
        timeout_secs: 5,
    }
}

fn passage() -> Passage {
    Passage {
        title: "The Journalist's Diet".into(),
        content: "<p>Journalism, nutrition and diligence.</p>".into(),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

// ── Fetcher ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn fetcher_returns_body_and_sends_user_agent() {
    let router = Router::new().route(
        "/list.pdf",
        get(|headers: HeaderMap| async move {
            let ua = headers
                .get(header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            format!("%PDF-1.7 {ua}")
        }),
    );
    let base = spawn_server(router).await;

    let bytes = fetcher(5)
        .fetch(&format!("{base}/list.pdf"))
        .await
        .expect("download");

    assert_eq!(
        String::from_utf8(bytes).unwrap(),
        "%PDF-1.7 Mozilla/5.0 (vocab2post test)"
    );
}

#[tokio::test]
async fn fetcher_rejects_non_success_status() {
    let base = spawn_server(Router::new()).await;

    let err = fetcher(5)
        .fetch(&format!("{base}/missing.pdf"))
        .await
        .expect_err("404");

    assert_eq!(err.kind(), "FetchError");
    assert!(err.to_string().contains("404"), "got: {err}");
}

#[tokio::test]
async fn fetcher_times_out() {
    let router = Router::new().route(
        "/slow.pdf",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "%PDF-1.7"
        }),
    );
    let base = spawn_server(router).await;

    let err = fetcher(1)
        .fetch(&format!("{base}/slow.pdf"))
        .await
        .expect_err("timeout");

    assert!(
        matches!(err, Vocab2PostError::FetchTimeout { secs: 1, .. }),
        "got: {err:?}"
    );
}

// ── Messages backend ─────────────────────────────────────────────────────────

#[tokio::test]
async fn messages_backend_sends_credentials_and_reads_first_text_block() {
    let seen = Seen::default();
    let router = Router::new()
        .route(
            "/v1/messages",
            post(
                |State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>| async move {
                    seen.0.lock().unwrap().push((headers, body));
                    Json(json!({
                        "content": [
                            { "type": "thinking", "thinking": "Three words, one diet." },
                            { "type": "text", "text": "{\"title\":\"T\",\"content\":\"<p>C</p>\"}" }
                        ]
                    }))
                },
            ),
        )
        .with_state(seen.clone());
    let base = spawn_server(router).await;

    let reply = messages_backend(format!("{base}/v1/messages"))
        .complete("Write about: journalism")
        .await
        .expect("completion");

    assert_eq!(reply, r#"{"title":"T","content":"<p>C</p>"}"#);

    let requests = seen.requests();
    assert_eq!(requests.len(), 1);
    let (headers, body) = &requests[0];
    assert_eq!(headers["x-api-key"], "sk-test");
    assert_eq!(headers[header::AUTHORIZATION], "Bearer sk-test");
    assert_eq!(headers["anthropic-version"], "2023-06-01");
    assert_eq!(body["model"], "test-model");
    assert_eq!(body["max_tokens"], 512);
    assert_eq!(body["messages"][0]["role"], "user");
    assert_eq!(body["messages"][0]["content"], "Write about: journalism");
}

#[tokio::test]
async fn messages_backend_maps_error_status() {
    let router = Router::new().route(
        "/v1/messages",
        post(|| async {
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({ "error": { "type": "rate_limit_error" } })),
            )
        }),
    );
    let base = spawn_server(router).await;

    let err = messages_backend(format!("{base}/v1/messages"))
        .complete("hello")
        .await
        .expect_err("429");

    assert_eq!(err.kind(), "GenerationError");
    assert!(err.to_string().contains("429"), "got: {err}");
}

// ── WordPress publisher ──────────────────────────────────────────────────────

fn wordpress_mock(seen: Seen, status: StatusCode) -> Router {
    Router::new()
        .route(
            "/wp-json/wp/v2/posts",
            post(
                move |State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>| async move {
                    seen.0.lock().unwrap().push((headers, body));
                    let reply = if status.is_success() {
                        json!({ "id": 42, "status": "publish" })
                    } else {
                        json!({ "code": "rest_cannot_create" })
                    };
                    (status, Json(reply))
                },
            ),
        )
        .with_state(seen)
}

#[tokio::test]
async fn publisher_posts_published_passage_with_basic_auth() {
    let seen = Seen::default();
    let base = spawn_server(wordpress_mock(seen.clone(), StatusCode::CREATED)).await;

    let response = wordpress(format!("{base}/wp-json/wp/v2/posts"))
        .publish(&passage())
        .await
        .expect("published");

    assert_eq!(response["id"], 42);

    let requests = seen.requests();
    assert_eq!(requests.len(), 1);
    let (headers, body) = &requests[0];
    assert_eq!(
        headers[header::AUTHORIZATION].to_str().unwrap(),
        basic_auth("editor", "abcd efgh ijkl mnop")
    );
    assert_eq!(
        *body,
        json!({
            "title": "The Journalist's Diet",
            "content": "<p>Journalism, nutrition and diligence.</p>",
            "status": "publish"
        })
    );
}

#[tokio::test]
async fn publisher_reports_rejection_status() {
    let base = spawn_server(wordpress_mock(Seen::default(), StatusCode::UNAUTHORIZED)).await;

    let err = wordpress(format!("{base}/wp-json/wp/v2/posts"))
        .publish(&passage())
        .await
        .expect_err("401");

    assert!(
        matches!(err, Vocab2PostError::Publish { status: Some(401), .. }),
        "got: {err:?}"
    );
    assert!(err.to_string().contains("rest_cannot_create"));
}

#[tokio::test]
async fn publisher_rejects_non_json_success_body() {
    let router = Router::new().route(
        "/wp-json/wp/v2/posts",
        post(|| async { "<html>maintenance</html>" }),
    );
    let base = spawn_server(router).await;

    let err = wordpress(format!("{base}/wp-json/wp/v2/posts"))
        .publish(&passage())
        .await
        .expect_err("not json");

    assert_eq!(err.kind(), "PublishError");
}

// ── Router ───────────────────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingDispatcher(Mutex<Vec<String>>);

#[async_trait]
impl JobDispatcher for RecordingDispatcher {
    async fn dispatch(&self, url: String) {
        self.0.lock().unwrap().push(url);
    }
}

#[tokio::test]
async fn index_serves_submission_form() {
    let app = build_router(Arc::new(RecordingDispatcher::default()));

    let response = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(bytes, INDEX_HTML.as_bytes());
}

#[tokio::test]
async fn webhook_accepts_and_dispatches_url() {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let app = build_router(dispatcher.clone());

    let response = app
        .oneshot(
            Request::post("/webhook")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"url":"https://example.com/list.pdf"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: StatusResponse = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(
        body,
        StatusResponse {
            status: "accepted".into()
        }
    );
    assert_eq!(
        *dispatcher.0.lock().unwrap(),
        vec!["https://example.com/list.pdf".to_string()]
    );
}

#[tokio::test]
async fn webhook_rejects_malformed_body_without_dispatching() {
    let dispatcher = Arc::new(RecordingDispatcher::default());

    for body in ["not json", r#"{"link":"https://example.com/list.pdf"}"#] {
        let response = build_router(dispatcher.clone())
            .oneshot(
                Request::post("/webhook")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(
            response.status().is_client_error(),
            "{body}: {}",
            response.status()
        );
    }

    assert!(dispatcher.0.lock().unwrap().is_empty());
}

#[tokio::test]
async fn health_reports_ok() {
    let app = build_router(Arc::new(RecordingDispatcher::default()));

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "status": "ok" }));
}

// ── Whole service ────────────────────────────────────────────────────────────

/// Stands in for pdfium; everything else is real HTTP.
struct FixedText;

#[async_trait]
impl TextExtractor for FixedText {
    async fn extract_text(&self, pdf: &[u8]) -> Result<String, Vocab2PostError> {
        assert!(pdf.starts_with(b"%PDF"));
        Ok("1 journalism\n2 nutrition\nsome noise\n3 diligence\n".into())
    }
}

#[tokio::test]
async fn webhook_job_fetches_generates_and_publishes() {
    let posts = Seen::default();
    let prompts = Seen::default();
    let upstream = Router::new()
        .route("/list.pdf", get(|| async { "%PDF-1.7 stub" }))
        .merge(
            Router::new()
                .route(
                    "/v1/messages",
                    post(
                        |State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>| async move {
                            seen.0.lock().unwrap().push((headers, body));
                            Json(json!({ "content": [{
                                "type": "text",
                                "text": "```json\n{\"title\":\"The Journalist's Diet\",\"content\":\"<p>...</p>\"}\n```"
                            }]}))
                        },
                    ),
                )
                .with_state(prompts.clone()),
        )
        .merge(wordpress_mock(posts.clone(), StatusCode::CREATED));
    let base = spawn_server(upstream).await;

    let pipeline = Pipeline::new(
        Arc::new(fetcher(5)),
        Arc::new(FixedText),
        Arc::new(messages_backend(format!("{base}/v1/messages"))),
        Arc::new(wordpress(format!("{base}/wp-json/wp/v2/posts"))),
    );
    let app = build_router(Arc::new(InlineDispatcher::new(Arc::new(pipeline))));

    let response = app
        .oneshot(
            Request::post("/webhook")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "url": format!("{base}/list.pdf") }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let prompts = prompts.requests();
    assert_eq!(prompts.len(), 1);
    let prompt = prompts[0].1["messages"][0]["content"].as_str().unwrap();
    assert!(prompt.ends_with("journalism, nutrition, diligence"), "got: {prompt}");

    let posts = posts.requests();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].1["title"], "The Journalist's Diet");
    assert_eq!(posts[0].1["status"], "publish");
}

// ── Background dispatch ──────────────────────────────────────────────────────

struct LocalPdf;

#[async_trait]
impl DocumentFetcher for LocalPdf {
    async fn fetch(&self, _url: &str) -> Result<Vec<u8>, Vocab2PostError> {
        Ok(b"%PDF-1.7 stub".to_vec())
    }
}

/// Holds every completion until the test releases the gate.
struct GatedBackend(Arc<Notify>);

#[async_trait]
impl CompletionBackend for GatedBackend {
    async fn complete(&self, _prompt: &str) -> Result<String, Vocab2PostError> {
        self.0.notified().await;
        Ok(r#"{"title":"The Journalist's Diet","content":"<p>...</p>"}"#.into())
    }
}

/// Counts attempts; keeps the passage only when `accept` is set.
struct CountingPublisher {
    accept: bool,
    attempts: Mutex<usize>,
    posts: Mutex<Vec<Passage>>,
}

impl CountingPublisher {
    fn new(accept: bool) -> Arc<Self> {
        Arc::new(Self {
            accept,
            attempts: Mutex::new(0),
            posts: Mutex::new(Vec::new()),
        })
    }

    fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl Publisher for CountingPublisher {
    async fn publish(&self, passage: &Passage) -> Result<Value, Vocab2PostError> {
        *self.attempts.lock().unwrap() += 1;
        if !self.accept {
            return Err(Vocab2PostError::Publish {
                status: Some(500),
                detail: "database unavailable".into(),
            });
        }
        self.posts.lock().unwrap().push(passage.clone());
        Ok(json!({ "id": 1 }))
    }
}

/// Build a spawning router over the gated pipeline and submit one URL.
async fn submit_in_background(
    gate: Arc<Notify>,
    publisher: Arc<CountingPublisher>,
) -> axum::response::Response {
    let pipeline = Pipeline::new(
        Arc::new(LocalPdf),
        Arc::new(FixedText),
        Arc::new(GatedBackend(gate)),
        publisher,
    );
    build_router(Arc::new(SpawnDispatcher::new(Arc::new(pipeline))))
        .oneshot(
            Request::post("/webhook")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"url":"https://example.com/list.pdf"}"#))
                .unwrap(),
        )
        .await
        .unwrap()
}

/// Poll `done` until it holds or five seconds pass.
async fn wait_for(done: impl Fn() -> bool) -> bool {
    for _ in 0..500 {
        if done() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    done()
}

#[tokio::test]
async fn webhook_answers_before_the_spawned_job_finishes() {
    let gate = Arc::new(Notify::new());
    let publisher = CountingPublisher::new(true);

    let response = submit_in_background(gate.clone(), publisher.clone()).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "status": "accepted" }));
    assert_eq!(publisher.attempts(), 0, "job must still be waiting on the model");

    gate.notify_one();
    assert!(wait_for(|| publisher.posts.lock().unwrap().len() == 1).await);
    assert_eq!(
        publisher.posts.lock().unwrap()[0].title,
        "The Journalist's Diet"
    );
}

#[tokio::test]
async fn webhook_accepts_even_when_the_spawned_job_fails() {
    let gate = Arc::new(Notify::new());
    let publisher = CountingPublisher::new(false);

    let response = submit_in_background(gate.clone(), publisher.clone()).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "status": "accepted" }));

    gate.notify_one();
    assert!(wait_for(|| publisher.attempts() == 1).await);
    assert!(publisher.posts.lock().unwrap().is_empty());
}
