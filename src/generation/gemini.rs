use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use futures_util::future::BoxFuture;

use super::types::{GenerateContentRequest, GenerateContentResponse, LlmTransport};
use super::GenerationError;
use crate::config::ApiKey;

/// Upstream error bodies are cut to this many characters before they reach
/// an error value or a log line.
const MAX_ERROR_BODY_CHARS: usize = 300;

/// HTTP client for the Gemini `generateContent` endpoint.
pub struct GeminiTransport {
    base_url: String,
    api_key: ApiKey,
    client: reqwest::Client,
}

impl GeminiTransport {
    /// Build a transport for `base_url` (e.g. `https://…/v1beta`).
    ///
    /// Only the connect phase is bounded here; the per-attempt deadline is
    /// owned by the ladder.
    pub fn new(
        base_url: &str,
        api_key: ApiKey,
        connect_timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| GenerationError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    async fn post(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GenerationError> {
        let response = self
            .client
            .post(self.endpoint(model))
            .query(&[("key", self.api_key.expose())])
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    GenerationError::Connection(self.base_url.clone())
                } else {
                    // The request URL carries the key; keep it out of messages.
                    GenerationError::HttpClient(e.without_url().to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::UpstreamStatus {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| GenerationError::ResponseParsing(e.without_url().to_string()))
    }
}

impl LlmTransport for GeminiTransport {
    fn generate_content<'a>(
        &'a self,
        model: &'a str,
        request: &'a GenerateContentRequest,
    ) -> BoxFuture<'a, Result<GenerateContentResponse, GenerationError>> {
        Box::pin(self.post(model, request))
    }
}

// ──────────────────────────────────────────────
// Mock transport
// ──────────────────────────────────────────────

/// Scripted outcome for one [`MockTransport`] call.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Single candidate with this text.
    Text(String),
    /// Arbitrary response body, e.g. zero candidates.
    Response(GenerateContentResponse),
    /// Non-success HTTP status.
    Status(u16),
    /// Connection refused.
    Unreachable,
    /// Never completes.
    Hang,
}

/// A call observed by [`MockTransport`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub request: GenerateContentRequest,
}

/// Mock transport for testing: replays scripted outcomes in order and
/// records every call. Once the script runs out, each call uses the
/// fallback outcome (unreachable by default).
pub struct MockTransport {
    script: Mutex<VecDeque<MockOutcome>>,
    fallback: MockOutcome,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    pub fn new(script: Vec<MockOutcome>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: MockOutcome::Unreachable,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call produces `outcome`.
    pub fn always(outcome: MockOutcome) -> Self {
        Self {
            fallback: outcome,
            ..Self::new(Vec::new())
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    fn next_outcome(&self, model: &str, request: &GenerateContentRequest) -> MockOutcome {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(RecordedCall {
                model: model.to_string(),
                request: request.clone(),
            });
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

impl LlmTransport for MockTransport {
    fn generate_content<'a>(
        &'a self,
        model: &'a str,
        request: &'a GenerateContentRequest,
    ) -> BoxFuture<'a, Result<GenerateContentResponse, GenerationError>> {
        let outcome = self.next_outcome(model, request);
        Box::pin(async move {
            match outcome {
                MockOutcome::Text(text) => Ok(GenerateContentResponse::from_text(text)),
                MockOutcome::Response(response) => Ok(response),
                MockOutcome::Status(status) => Err(GenerationError::UpstreamStatus {
                    status,
                    body: "mock upstream error".into(),
                }),
                MockOutcome::Unreachable => {
                    Err(GenerationError::Connection("mock://unreachable".into()))
                }
                MockOutcome::Hang => futures_util::future::pending().await,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::types::{Content, CHAT_GENERATION};
    use axum::extract::{Path, RawQuery, State};
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::sync::Arc;

    #[derive(Debug, Default)]
    struct Seen {
        paths: Vec<String>,
        queries: Vec<String>,
        bodies: Vec<serde_json::Value>,
    }

    type Stub = Arc<(Mutex<Seen>, StatusCode, serde_json::Value)>;

    async fn stub_handler(
        State(stub): State<Stub>,
        Path(model_action): Path<String>,
        RawQuery(query): RawQuery,
        Json(body): Json<serde_json::Value>,
    ) -> (StatusCode, Json<serde_json::Value>) {
        let mut seen = stub.0.lock().unwrap();
        seen.paths.push(model_action);
        seen.queries.push(query.unwrap_or_default());
        seen.bodies.push(body);
        (stub.1, Json(stub.2.clone()))
    }

    /// Local upstream stand-in; returns its base URL and the shared log.
    async fn spawn_stub(status: StatusCode, reply: serde_json::Value) -> (String, Stub) {
        let stub: Stub = Arc::new((Mutex::new(Seen::default()), status, reply));
        let app = Router::new()
            .route("/v1beta/models/:model_action", post(stub_handler))
            .with_state(stub.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/v1beta"), stub)
    }

    fn chat_request() -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::user("hello")],
            generation_config: CHAT_GENERATION,
        }
    }

    fn key(raw: &str) -> ApiKey {
        ApiKey::sanitize(raw).unwrap()
    }

    #[test]
    fn transport_trims_trailing_slash() {
        let t = GeminiTransport::new("http://localhost:9/v1beta/", key("k"), Duration::from_secs(1))
            .unwrap();
        assert_eq!(t.base_url, "http://localhost:9/v1beta");
        assert_eq!(
            t.endpoint("gemini-2.0-flash"),
            "http://localhost:9/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn posts_to_model_endpoint_with_key() {
        let reply = serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "hi there" }] } }]
        });
        let (base, stub) = spawn_stub(StatusCode::OK, reply).await;
        let quoted = key("  \"test-key-with-quotes\"  ");
        let t = GeminiTransport::new(&base, quoted, Duration::from_secs(2)).unwrap();

        let response = t
            .generate_content("gemini-2.0-flash", &chat_request())
            .await
            .unwrap();
        assert_eq!(response.first_text(), Some("hi there"));

        let seen = stub.0.lock().unwrap();
        assert_eq!(seen.paths, vec!["gemini-2.0-flash:generateContent"]);
        assert_eq!(seen.queries, vec!["key=test-key-with-quotes"]);
        assert_eq!(seen.bodies[0]["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(seen.bodies[0]["generationConfig"]["maxOutputTokens"], 1024);
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let (base, _stub) =
            spawn_stub(StatusCode::NOT_FOUND, serde_json::json!({ "error": "no model" })).await;
        let t = GeminiTransport::new(&base, key("k"), Duration::from_secs(2)).unwrap();

        let err = t.generate_content("missing", &chat_request()).await.unwrap_err();
        match err {
            GenerationError::UpstreamStatus { status, body } => {
                assert_eq!(status, 404);
                assert!(body.contains("no model"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unexpected_body_is_a_parsing_error() {
        let (base, _stub) = spawn_stub(StatusCode::OK, serde_json::json!([1, 2, 3])).await;
        let t = GeminiTransport::new(&base, key("k"), Duration::from_secs(2)).unwrap();

        let err = t.generate_content("m", &chat_request()).await.unwrap_err();
        assert!(matches!(err, GenerationError::ResponseParsing(_)));
    }

    #[tokio::test]
    async fn unreachable_upstream_is_a_connection_error() {
        // Bind then drop to get a port with nothing listening.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let base = format!("http://{addr}");
        let t = GeminiTransport::new(&base, key("secret"), Duration::from_secs(2)).unwrap();
        let err = t.generate_content("m", &chat_request()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Connection(_)));
        assert!(!err.to_string().contains("secret"));
    }

    #[tokio::test]
    async fn mock_replays_script_then_fallback() {
        let mock = MockTransport::new(vec![
            MockOutcome::Status(500),
            MockOutcome::Text("scripted".into()),
        ]);
        let request = chat_request();

        assert!(mock.generate_content("a", &request).await.is_err());
        let ok = mock.generate_content("b", &request).await.unwrap();
        assert_eq!(ok.first_text(), Some("scripted"));
        let fallback = mock.generate_content("c", &request).await.unwrap_err();
        assert!(matches!(fallback, GenerationError::Connection(_)));

        let models: Vec<_> = mock.calls().into_iter().map(|c| c.model).collect();
        assert_eq!(models, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn mock_always_repeats_outcome() {
        let mock = MockTransport::always(MockOutcome::Text("same".into()));
        for _ in 0..3 {
            let r = mock.generate_content("m", &chat_request()).await.unwrap();
            assert_eq!(r.first_text(), Some("same"));
        }
        assert_eq!(mock.call_count(), 3);
    }
}
