//! Integration tests for the Gemini transport and the diagnosis pipeline
//!
//! Each test starts a local stub of the `generateContent` endpoint on
//! `127.0.0.1:0` and drives the real reqwest transport against it.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thosua_diagnosis::{
    CallClass, DiagnosisInput, Diagnoser, Error, GeminiConfig, GeminiTransport, RetryPolicy,
    Severity, TechnicianRoster, Transport,
};

const API_KEY: &str = "AIzaStubKey0123456789";

type Responder = Arc<dyn Fn(usize) -> (StatusCode, String) + Send + Sync>;

#[derive(Clone)]
struct Recorded {
    action: String,
    key: Option<String>,
    body: Value,
}

#[derive(Clone)]
struct Stub {
    hits: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<Recorded>>>,
    respond: Responder,
    delay: Duration,
}

impl Stub {
    fn new(respond: impl Fn(usize) -> (StatusCode, String) + Send + Sync + 'static) -> Self {
        Self {
            hits: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
            respond: Arc::new(respond),
            delay: Duration::ZERO,
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    fn recorded(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

async fn generate(
    State(stub): State<Stub>,
    Path(action): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    let hit = stub.hits.fetch_add(1, Ordering::SeqCst);
    stub.requests.lock().unwrap().push(Recorded {
        action,
        key: query.get("key").cloned(),
        body,
    });
    if !stub.delay.is_zero() {
        tokio::time::sleep(stub.delay).await;
    }
    (stub.respond)(hit)
}

/// Serve the stub and return its base URL
async fn serve(stub: Stub) -> String {
    let app = Router::new()
        .route("/v1beta/models/:action", post(generate))
        .with_state(stub);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });

    format!("http://{}/v1beta", addr)
}

fn envelope(text: &str) -> String {
    serde_json::json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }],
        "usageMetadata": {"promptTokenCount": 120, "candidatesTokenCount": 60, "totalTokenCount": 180}
    })
    .to_string()
}

fn washer_reply() -> String {
    envelope(
        "```json\n{\"category\":\"Máy Giặt\",\"problem\":\"không vắt\",\"severity\":\"Trung Bình\",\"solution\":\"Kiểm tra dây curoa\",\"estimatedCost\":\"200,000đ\"}\n```",
    )
}

fn config(base_url: &str) -> GeminiConfig {
    GeminiConfig::new(API_KEY)
        .with_base_url(base_url)
        .with_model("gemini-2.0-flash")
}

fn diagnoser(config: GeminiConfig) -> Diagnoser {
    let transport = GeminiTransport::new(config).expect("transport");
    Diagnoser::new(Arc::new(transport), TechnicianRoster::default())
}

// ============================================================================
// Success path
// ============================================================================

#[tokio::test]
async fn test_text_diagnosis_over_http() {
    let stub = Stub::new(|_| (StatusCode::OK, washer_reply()));
    let base_url = serve(stub.clone()).await;

    let result = diagnoser(config(&base_url))
        .diagnose(&DiagnosisInput::text("Máy giặt không vắt được"))
        .await
        .expect("diagnosis");

    assert_eq!(result.category, "Máy Giặt");
    assert_eq!(result.problem, "không vắt");
    assert_eq!(result.severity, Severity::Medium);
    assert_eq!(result.estimated_cost, "200,000đ");
    assert_eq!(result.recommended_technicians.len(), 2);

    let recorded = stub.recorded();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].action, "gemini-2.0-flash:generateContent");
    assert_eq!(recorded[0].key.as_deref(), Some(API_KEY));

    let body = &recorded[0].body;
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("Máy giặt không vắt được"));
    assert!(body["generationConfig"]["temperature"].is_number());
    assert!(body["generationConfig"]["topK"].is_number());
    assert!(body["generationConfig"]["topP"].is_number());
    assert!(body["generationConfig"]["maxOutputTokens"].is_number());
    assert!(body.get("systemInstruction").is_none());
}

#[tokio::test]
async fn test_image_diagnosis_sends_inline_data() {
    let stub = Stub::new(|_| (StatusCode::OK, washer_reply()));
    let base_url = serve(stub.clone()).await;

    diagnoser(config(&base_url))
        .diagnose(&DiagnosisInput::image(vec![0x89, b'P', b'N', b'G'], "may-giat.png"))
        .await
        .expect("diagnosis");

    let body = &stub.recorded()[0].body;
    let inline = &body["contents"][0]["parts"][1]["inlineData"];
    assert_eq!(inline["mimeType"], "image/png");
    assert_eq!(inline["data"], "iVBORw==");
}

#[tokio::test]
async fn test_non_json_reply_yields_fallback() {
    let stub = Stub::new(|_| (StatusCode::OK, envelope("Xin chào, tôi không hiểu.")));
    let base_url = serve(stub).await;

    let result = diagnoser(config(&base_url))
        .diagnose(&DiagnosisInput::text("xyz"))
        .await
        .expect("fallback is a successful result");

    assert!(result.is_undetermined());
    assert_eq!(result.category, "Không xác định");
    assert_eq!(result.recommended_technicians.len(), 2);
}

#[tokio::test]
async fn test_transport_returns_body_unmodified() {
    let stub = Stub::new(|_| (StatusCode::OK, "not an envelope".to_string()));
    let base_url = serve(stub).await;

    let transport = GeminiTransport::new(config(&base_url)).unwrap();
    let request = thosua_diagnosis::prompt::build_diagnosis_request(&DiagnosisInput::text("a"));
    let body = transport.generate(CallClass::Chat, &request).await.unwrap();
    assert_eq!(body, "not an envelope");
}

// ============================================================================
// Transport errors
// ============================================================================

#[tokio::test]
async fn test_server_error_is_surfaced() {
    let stub = Stub::new(|_| (StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string()));
    let base_url = serve(stub.clone()).await;

    let err = diagnoser(config(&base_url))
        .diagnose(&DiagnosisInput::text("Tivi mất hình"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ServerError(_)));
    assert!(err.is_transport());
    assert_eq!(stub.hits(), 1, "no retry by default");
}

#[tokio::test]
async fn test_client_error_is_sanitized() {
    let stub = Stub::new(|_| {
        (
            StatusCode::BAD_REQUEST,
            r#"{"error": {"code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT"}}"#
                .to_string(),
        )
    });
    let base_url = serve(stub).await;

    let err = diagnoser(config(&base_url))
        .diagnose(&DiagnosisInput::text("Lò vi sóng không nóng"))
        .await
        .unwrap_err();

    match err {
        Error::Api(message) => {
            assert!(message.starts_with("Khóa API Gemini"));
            assert!(!message.contains("not valid"));
            assert!(!message.contains(API_KEY));
        }
        other => panic!("Expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_rate_limit() {
    let stub = Stub::new(|_| (StatusCode::TOO_MANY_REQUESTS, "{}".to_string()));
    let base_url = serve(stub).await;

    let err = diagnoser(config(&base_url))
        .diagnose(&DiagnosisInput::text("Điều hòa chảy nước"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::RateLimit));
}

#[tokio::test]
async fn test_timeout_is_surfaced() {
    let stub = Stub::new(|_| (StatusCode::OK, washer_reply())).with_delay(Duration::from_secs(2));
    let base_url = serve(stub).await;

    let err = diagnoser(config(&base_url).with_chat_timeout(Duration::from_millis(200)))
        .diagnose(&DiagnosisInput::text("Máy giặt không vắt được"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Timeout(200)), "got {:?}", err);
}

#[tokio::test]
async fn test_vision_calls_use_vision_budget() {
    let stub = Stub::new(|_| (StatusCode::OK, washer_reply())).with_delay(Duration::from_millis(300));
    let base_url = serve(stub).await;

    let diagnoser = diagnoser(
        config(&base_url)
            .with_chat_timeout(Duration::from_millis(100))
            .with_vision_timeout(Duration::from_secs(5)),
    );

    let text = diagnoser.diagnose(&DiagnosisInput::text("Tủ lạnh kêu to")).await;
    assert!(matches!(text, Err(Error::Timeout(100))));

    let image = diagnoser
        .diagnose(&DiagnosisInput::image(vec![0xff, 0xd8, 0xff], "tu-lanh.jpg"))
        .await;
    assert_eq!(image.expect("vision call within budget").category, "Máy Giặt");
}

#[tokio::test]
async fn test_connection_refused() {
    // Bind then drop to get a port with nothing listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = diagnoser(config(&format!("http://{}/v1beta", addr)))
        .diagnose(&DiagnosisInput::text("Bếp từ không nhận nồi"))
        .await
        .unwrap_err();

    match err {
        Error::Network(message) => assert!(!message.contains(API_KEY)),
        other => panic!("Expected Network error, got {:?}", other),
    }
}

// ============================================================================
// Retry policy
// ============================================================================

#[tokio::test]
async fn test_bounded_retry_recovers_transient_failure() {
    let stub = Stub::new(|hit| {
        if hit < 2 {
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable".to_string())
        } else {
            (StatusCode::OK, washer_reply())
        }
    });
    let base_url = serve(stub.clone()).await;

    let result = diagnoser(config(&base_url).with_retry(RetryPolicy {
        max_retries: 2,
        base_delay: Duration::from_millis(10),
    }))
    .diagnose(&DiagnosisInput::text("Máy giặt không vắt được"))
    .await
    .expect("recovered after retries");

    assert_eq!(result.category, "Máy Giặt");
    assert_eq!(stub.hits(), 3);
}

#[tokio::test]
async fn test_retry_gives_up_after_limit() {
    let stub = Stub::new(|_| (StatusCode::BAD_GATEWAY, "bad gateway".to_string()));
    let base_url = serve(stub.clone()).await;

    let err = diagnoser(config(&base_url).with_retry(RetryPolicy {
        max_retries: 1,
        base_delay: Duration::from_millis(10),
    }))
    .diagnose(&DiagnosisInput::text("Quạt không quay"))
    .await
    .unwrap_err();

    assert!(matches!(err, Error::ServerError(_)));
    assert_eq!(stub.hits(), 2);
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let stub = Stub::new(|_| (StatusCode::BAD_REQUEST, "{}".to_string()));
    let base_url = serve(stub.clone()).await;

    let err = diagnoser(config(&base_url).with_retry(RetryPolicy {
        max_retries: 3,
        base_delay: Duration::from_millis(10),
    }))
    .diagnose(&DiagnosisInput::text("Máy lọc nước rỉ"))
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Api(_)));
    assert_eq!(stub.hits(), 1);
}
