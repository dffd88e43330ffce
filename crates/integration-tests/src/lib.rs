//! Integration test harness for Leafspring CRM.
//!
//! [`TestContext::start`] boots the real router on an ephemeral port over a
//! fresh data file, pointed at a [`FakeUpstream`] that plays scripted
//! chat-completion replies and records every request it receives.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p leafspring-crm-integration-tests
//! ```
//!
//! No external services are needed.

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    routing::post,
};
use reqwest::Method;
use serde_json::{Value, json};

use leafspring_crm_server::config::CrmConfig;
use leafspring_crm_server::routes;
use leafspring_crm_server::state::AppState;

/// Password of the seeded `admin` user.
pub const ADMIN_PASSWORD: &str = "Leaf-spring-Q7x!";

// =============================================================================
// Fake upstream
// =============================================================================

/// One scripted upstream reply.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    status: StatusCode,
    body: Value,
}

impl UpstreamReply {
    /// A final answer.
    #[must_use]
    pub fn answer(content: &str) -> Self {
        Self {
            status: StatusCode::OK,
            body: json!({
                "id": "cmpl-1",
                "choices": [{
                    "index": 0,
                    "message": { "role": "assistant", "content": content },
                    "finish_reason": "stop"
                }]
            }),
        }
    }

    /// A request to call the built-in tool `name`.
    #[must_use]
    pub fn tool_call(id: &str, name: &str, arguments: &str) -> Self {
        Self {
            status: StatusCode::OK,
            body: json!({
                "id": "cmpl-2",
                "choices": [{
                    "index": 0,
                    "message": {
                        "role": "assistant",
                        "content": "",
                        "tool_calls": [{
                            "id": id,
                            "type": "builtin_function",
                            "function": { "name": name, "arguments": arguments }
                        }]
                    },
                    "finish_reason": "tool_calls"
                }]
            }),
        }
    }

    /// An error envelope with an HTTP status.
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self {
            status: StatusCode::from_u16(status).expect("status"),
            body: json!({ "error": { "message": message, "type": "server_error" } }),
        }
    }
}

/// A request the fake upstream received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Default)]
struct UpstreamState {
    replies: Mutex<VecDeque<UpstreamReply>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Chat-completion endpoint serving scripted replies.
#[derive(Clone)]
pub struct FakeUpstream {
    url: String,
    state: Arc<UpstreamState>,
}

impl FakeUpstream {
    /// Start serving `replies` in order on an ephemeral port.
    pub async fn start(replies: Vec<UpstreamReply>) -> Self {
        let state = Arc::new(UpstreamState {
            replies: Mutex::new(replies.into()),
            requests: Mutex::default(),
        });

        let app = Router::new()
            .route("/v1/chat/completions", post(complete))
            .with_state(Arc::clone(&state));
        let addr = serve(app).await;

        Self {
            url: format!("http://{addr}/v1/chat/completions"),
            state,
        }
    }

    /// Endpoint URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().expect("requests lock").clone()
    }
}

async fn complete(
    State(state): State<Arc<UpstreamState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state
        .requests
        .lock()
        .expect("requests lock")
        .push(RecordedRequest {
            authorization: headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(String::from),
            body,
        });

    let reply = state.replies.lock().expect("replies lock").pop_front();
    match reply {
        Some(reply) => (reply.status, Json(reply.body)),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": { "message": "no scripted reply" } })),
        ),
    }
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    addr
}

// =============================================================================
// Test context
// =============================================================================

/// A running CRM server plus its fake upstream.
pub struct TestContext {
    pub client: reqwest::Client,
    pub base_url: String,
    pub data_file: PathBuf,
    pub upstream: FakeUpstream,
}

impl TestContext {
    /// Boot a server over a fresh data file with `replies` scripted upstream.
    pub async fn start(replies: Vec<UpstreamReply>) -> Self {
        let upstream = FakeUpstream::start(replies).await;
        let llm_url = upstream.url().to_string();
        Self::boot(upstream, llm_url).await
    }

    /// Boot a server whose LLM endpoint is a closed local port.
    ///
    /// Every upstream call fails to connect; `upstream` stays idle.
    pub async fn start_unreachable() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let upstream = FakeUpstream::start(Vec::new()).await;
        Self::boot(upstream, format!("http://{addr}/v1/chat/completions")).await
    }

    async fn boot(upstream: FakeUpstream, llm_url: String) -> Self {
        let data_file = std::env::temp_dir()
            .join(format!("leafspring-it-{}", uuid::Uuid::new_v4()))
            .join("crm.json");

        let vars = [
            ("CRM_DATA_FILE", data_file.display().to_string()),
            ("CRM_ADMIN_PASSWORD", ADMIN_PASSWORD.to_string()),
            ("LLM_API_URL", llm_url),
        ];
        let config = CrmConfig::from_vars(|key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.clone())
        })
        .expect("config");

        let state = AppState::bootstrap(config).await.expect("bootstrap");
        let addr = serve(routes::app(state)).await;

        Self {
            client: reqwest::Client::new(),
            base_url: format!("http://{addr}"),
            data_file,
            upstream,
        }
    }

    /// Log in as `admin` and return the bearer token.
    pub async fn admin_token(&self) -> String {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/login",
                None,
                Some(json!({ "username": "admin", "password": ADMIN_PASSWORD })),
            )
            .await;
        assert_eq!(status, reqwest::StatusCode::OK, "login failed: {body}");
        body["token"].as_str().expect("token").to_string()
    }

    /// Send a request and decode the JSON response (`Null` if not JSON).
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (reqwest::StatusCode, Value) {
        let mut request = self
            .client
            .request(method, format!("{}{path}", self.base_url));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.expect("send");
        let status = response.status();
        let body = response.json().await.unwrap_or(Value::Null);
        (status, body)
    }
}
