//! HTTP client for the Notecard API with automatic token refresh.

use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::api::sse::SseDecoder;
use crate::api::stream::StreamHandle;
use crate::auth::guard::{AuthGuard, AuthPhase};
use crate::auth::{AuthStore, TokenStorage};
use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::util::compact_text;

const REFRESH_ENDPOINT: &str = "/auth/refresh";

/// Typed client for the Notecard REST and streaming endpoints.
///
/// Cloning is cheap; clones share tokens, the auth store and the refresh lock.
#[derive(Clone)]
pub struct ApiClient<S: TokenStorage> {
    inner: Arc<ClientInner<S>>,
}

struct ClientInner<S> {
    config: ClientConfig,
    http: reqwest::Client,
    storage: S,
    store: Arc<AuthStore>,
    guard: AuthGuard,
    /// Serializes refreshes so concurrent 401s share one refresh request.
    refresh_lock: Mutex<()>,
}

impl<S: TokenStorage> ApiClient<S> {
    pub fn new(config: ClientConfig, storage: S, store: Arc<AuthStore>) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|error| ApiError::InvalidConfiguration(error.to_string()))?;
        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                http,
                storage,
                store,
                guard: AuthGuard::default(),
                refresh_lock: Mutex::new(()),
            }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<AuthStore> {
        &self.inner.store
    }

    pub fn storage(&self) -> &S {
        &self.inner.storage
    }

    pub fn auth_phase(&self) -> AuthPhase {
        self.inner.guard.phase(Instant::now())
    }

    /// Issues a JSON request and decodes the response body into `T`.
    ///
    /// Never panics on HTTP failures: network errors, error statuses and auth
    /// failures all come back as [`ApiError`].
    pub(crate) async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> ApiResult<T> {
        let response = self.send_authorized(&method, endpoint, body.as_ref()).await?;
        read_json(response).await
    }

    /// Posts `body` and dispatches every SSE payload to `on_message` until the
    /// server closes the stream.
    pub(crate) async fn stream_sse<F>(
        &self,
        endpoint: &str,
        body: Value,
        mut on_message: F,
    ) -> ApiResult<()>
    where
        F: FnMut(Value) + Send,
    {
        let response = self
            .send_authorized(&Method::POST, endpoint, Some(&body))
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = if text.trim().is_empty() {
                format!("HTTP {}", status.as_u16())
            } else {
                text
            };
            return Err(ApiError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let mut decoder = SseDecoder::new();
        let mut stream = response.bytes_stream();
        let mut delivered = 0_usize;
        while let Some(chunk) = stream.next().await {
            for payload in decoder.feed(&chunk?) {
                delivered += 1;
                on_message(payload);
            }
        }
        tracing::debug!(endpoint, delivered, "SSE stream ended");
        Ok(())
    }

    /// Runs [`stream_sse`](Self::stream_sse) on the runtime and returns at once.
    ///
    /// A terminal failure reaches the callback as
    /// `{"type": "error", "error": "<message>"}`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub(crate) fn spawn_stream<F>(
        &self,
        endpoint: &'static str,
        body: Value,
        on_message: F,
    ) -> StreamHandle
    where
        F: FnMut(Value) + Send + 'static,
    {
        let client = self.clone();
        let task = tokio::spawn(async move {
            let mut on_message = on_message;
            if let Err(error) = client.stream_sse(endpoint, body, &mut on_message).await {
                tracing::warn!(endpoint, %error, "SSE stream failed");
                let message = error.to_string();
                let message = if message.trim().is_empty() {
                    "stream error".to_string()
                } else {
                    message
                };
                on_message(serde_json::json!({ "type": "error", "error": message }));
            }
        });
        StreamHandle::new(task)
    }

    /// Exchanges the stored refresh token for a new access token.
    ///
    /// Returns `false` when no refresh token is stored or the server rejects
    /// it. Never clears state on its own; callers decide whether to log out.
    pub async fn refresh_token(&self) -> bool {
        let stale = self.access_token();
        self.refresh_after(stale).await
    }

    async fn refresh_after(&self, stale: Option<String>) -> bool {
        let _refresh = self.inner.refresh_lock.lock().await;

        let current = self.access_token();
        if current.is_some() && current != stale {
            tracing::debug!("Access token was refreshed by a concurrent request");
            return true;
        }

        let refresh_token = match self.inner.storage.refresh_token() {
            Ok(Some(token)) => token,
            Ok(None) => {
                tracing::info!("No refresh token available");
                return false;
            }
            Err(error) => {
                tracing::warn!(%error, "Failed to read refresh token");
                return false;
            }
        };

        self.inner.guard.begin_refresh();
        let outcome = self.exchange_refresh_token(&refresh_token).await;
        self.inner.guard.finish_refresh();

        match outcome {
            Ok(()) => {
                tracing::info!("Token refreshed successfully");
                true
            }
            Err(error) => {
                tracing::warn!(%error, "Refresh token failed");
                false
            }
        }
    }

    async fn exchange_refresh_token(&self, refresh_token: &str) -> ApiResult<()> {
        let response = self
            .inner
            .http
            .post(self.url(REFRESH_ENDPOINT))
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: parse_api_error(status, &body),
            });
        }

        let payload = response
            .json::<RefreshResponse>()
            .await
            .map_err(|error| ApiError::Decode(error.to_string()))?;
        self.inner
            .storage
            .store_tokens(&payload.access_token, payload.refresh_token.as_deref())
    }

    /// Sends a request, refreshing and replaying it once on 401.
    async fn send_authorized(
        &self,
        method: &Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> ApiResult<Response> {
        let mut retried = false;
        loop {
            let sent_token = self.access_token();
            tracing::debug!(%method, endpoint, retried, "Sending API request");
            let response = self
                .build_request(method.clone(), endpoint, body, sent_token.as_deref())
                .send()
                .await?;

            if response.status() != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }

            if !retried {
                tracing::info!(endpoint, "401 Unauthorized, attempting token refresh");
                if self.refresh_after(sent_token).await {
                    tracing::debug!(endpoint, "Retrying request with refreshed token");
                    retried = true;
                    continue;
                }
            }

            self.handle_auth_error();
            return Err(ApiError::AuthenticationFailed);
        }
    }

    /// Clears tokens and the current user after an unrecoverable 401.
    ///
    /// Repeats within the cooldown window are ignored.
    fn handle_auth_error(&self) {
        if !self.inner.guard.try_begin_forced_logout(Instant::now()) {
            tracing::debug!("Auth error already handled, skipping forced logout");
            return;
        }

        if let Err(error) = self.inner.storage.clear() {
            tracing::warn!(%error, "Failed to clear stored tokens");
        }
        self.inner.store.set_user(None);
        tracing::info!("Token expired or invalid, user logged out");
    }

    fn build_request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
        access_token: Option<&str>,
    ) -> RequestBuilder {
        let mut request = self
            .inner
            .http
            .request(method, self.url(endpoint))
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = access_token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request
    }

    fn access_token(&self) -> Option<String> {
        self.inner
            .storage
            .access_token()
            .unwrap_or_else(|error| {
                tracing::warn!(%error, "Failed to read access token");
                None
            })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.inner.config.api_base_url, endpoint)
    }
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Decodes a response body, mapping error statuses to [`ApiError::Http`].
///
/// `204 No Content` and unparseable bodies both read as `{}`.
async fn read_json<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let status = response.status();
    let data = if status == StatusCode::NO_CONTENT {
        Value::Object(Map::new())
    } else {
        let bytes = response.bytes().await?;
        serde_json::from_slice::<Value>(&bytes).unwrap_or_else(|_| Value::Object(Map::new()))
    };

    if !status.is_success() {
        return Err(ApiError::Http {
            status: status.as_u16(),
            message: error_message(status, &data),
        });
    }

    serde_json::from_value(data).map_err(|error| ApiError::Decode(error.to_string()))
}

fn error_message(status: StatusCode, data: &Value) -> String {
    data.get("error")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map_or_else(|| status_message(status), ToString::to_string)
}

fn status_message(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("HTTP {}: {}", status.as_u16(), reason),
        None => format!("HTTP {}", status.as_u16()),
    }
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    let data = serde_json::from_str::<Value>(body).unwrap_or(Value::Null);
    if let Some(message) = data.get("error").and_then(Value::as_str) {
        return format!("{} ({})", message.trim(), status.as_u16());
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", compact_text(trimmed), status.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::auth::MemoryTokenStorage;
    use crate::models::{Empty, User};
    use crate::test_server::{MockResponse, MockServer};

    fn client_for(server: &MockServer, storage: MemoryTokenStorage) -> ApiClient<MemoryTokenStorage> {
        let config = ClientConfig::new(server.base_url(), None).unwrap();
        ApiClient::new(config, storage, Arc::new(AuthStore::new())).unwrap()
    }

    fn signed_in(client: &ApiClient<MemoryTokenStorage>) {
        client.store().set_user(Some(User {
            id: "u-1".to_string(),
            email: "u@example.com".to_string(),
            metadata: None,
        }));
    }

    #[test]
    fn error_message_prefers_server_error_field() {
        let data = json!({ "error": "Note not found" });
        assert_eq!(error_message(StatusCode::NOT_FOUND, &data), "Note not found");
        assert_eq!(
            error_message(StatusCode::NOT_FOUND, &json!({})),
            "HTTP 404: Not Found"
        );
    }

    #[tokio::test]
    async fn sends_bearer_token_and_decodes_json() {
        let server = MockServer::start(vec![MockResponse::json(200, json!({ "status": "ok" }))]).await;
        let client = client_for(&server, MemoryTokenStorage::with_tokens(Some("access-1"), None));

        let health: Value = client.request(Method::GET, "/health", None).await.unwrap();

        assert_eq!(health, json!({ "status": "ok" }));
        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, "/health");
        assert_eq!(requests[0].authorization.as_deref(), Some("Bearer access-1"));
    }

    #[tokio::test]
    async fn no_content_maps_to_empty_success() {
        let server = MockServer::start(vec![MockResponse::empty(204)]).await;
        let client = client_for(&server, MemoryTokenStorage::new());

        let result: Empty = client
            .request(Method::DELETE, "/api/notes/n-1", None)
            .await
            .unwrap();
        assert_eq!(result, Empty {});
        assert_eq!(server.requests()[0].method, "DELETE");
    }

    #[tokio::test]
    async fn error_status_surfaces_server_message_or_generic_text() {
        let server = MockServer::start(vec![
            MockResponse::json(404, json!({ "error": "Note not found" })),
            MockResponse::text(500, "<html>oops</html>"),
        ])
        .await;
        let client = client_for(&server, MemoryTokenStorage::new());

        let first = client
            .request::<Value>(Method::GET, "/api/notes/missing", None)
            .await
            .unwrap_err();
        assert_eq!(
            first,
            ApiError::Http {
                status: 404,
                message: "Note not found".to_string()
            }
        );

        let second = client
            .request::<Value>(Method::GET, "/api/notes/missing", None)
            .await
            .unwrap_err();
        assert_eq!(second.to_string(), "HTTP 500: Internal Server Error");
    }

    #[tokio::test]
    async fn unparseable_success_body_reads_as_empty_object() {
        let server = MockServer::start(vec![MockResponse::text(200, "not json")]).await;
        let client = client_for(&server, MemoryTokenStorage::new());

        let value: Value = client.request(Method::GET, "/health", None).await.unwrap();
        assert_eq!(value, json!({}));
    }

    #[tokio::test]
    async fn network_failure_is_returned_not_thrown() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let config = ClientConfig::new(base_url, None).unwrap();
        let client = ApiClient::new(config, MemoryTokenStorage::new(), Arc::new(AuthStore::new()))
            .unwrap();
        let error = client
            .request::<Value>(Method::GET, "/health", None)
            .await
            .unwrap_err();
        assert!(matches!(error, ApiError::Network(_)));
    }

    #[tokio::test]
    async fn single_401_refreshes_once_and_replays_once() {
        let server = MockServer::start(vec![
            MockResponse::json(401, json!({ "error": "expired" })),
            MockResponse::json(200, json!({ "access_token": "access-2" })),
            MockResponse::json(200, json!({ "ok": true })),
        ])
        .await;
        let storage = MemoryTokenStorage::with_tokens(Some("access-1"), Some("refresh-1"));
        let client = client_for(&server, storage.clone());

        let value: Value = client.request(Method::GET, "/api/notes", None).await.unwrap();

        assert_eq!(value, json!({ "ok": true }));
        let requests = server.requests();
        let paths = requests.iter().map(|r| r.path.as_str()).collect::<Vec<_>>();
        assert_eq!(paths, vec!["/api/notes", "/auth/refresh", "/api/notes"]);
        assert_eq!(requests[1].authorization, None);
        assert_eq!(
            serde_json::from_str::<Value>(&requests[1].body).unwrap(),
            json!({ "refresh_token": "refresh-1" })
        );
        assert_eq!(requests[2].authorization.as_deref(), Some("Bearer access-2"));
        assert_eq!(storage.access_token().unwrap().as_deref(), Some("access-2"));
        assert_eq!(storage.refresh_token().unwrap().as_deref(), Some("refresh-1"));
    }

    #[tokio::test]
    async fn failed_refresh_logs_out_and_clears_tokens() {
        let server = MockServer::start(vec![
            MockResponse::json(401, json!({})),
            MockResponse::json(401, json!({ "error": "invalid refresh token" })),
        ])
        .await;
        let storage = MemoryTokenStorage::with_tokens(Some("access-1"), Some("refresh-1"));
        let client = client_for(&server, storage.clone());
        signed_in(&client);

        let error = client
            .request::<Value>(Method::GET, "/auth/user", None)
            .await
            .unwrap_err();

        assert_eq!(error, ApiError::AuthenticationFailed);
        assert_eq!(server.requests().len(), 2);
        assert!(!client.store().is_authenticated());
        assert!(storage.access_token().unwrap().is_none());
        assert!(storage.refresh_token().unwrap().is_none());
        assert!(matches!(client.auth_phase(), AuthPhase::CoolingDown { .. }));
    }

    #[tokio::test]
    async fn second_401_after_refresh_is_terminal() {
        let server = MockServer::start(vec![
            MockResponse::json(401, json!({})),
            MockResponse::json(200, json!({ "access_token": "access-2", "refresh_token": "refresh-2" })),
            MockResponse::json(401, json!({})),
        ])
        .await;
        let storage = MemoryTokenStorage::with_tokens(Some("access-1"), Some("refresh-1"));
        let client = client_for(&server, storage.clone());
        signed_in(&client);

        let error = client
            .request::<Value>(Method::GET, "/api/notes", None)
            .await
            .unwrap_err();

        assert_eq!(error, ApiError::AuthenticationFailed);
        assert_eq!(server.requests().len(), 3);
        assert!(!client.store().is_authenticated());
        assert!(storage.access_token().unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_refresh_token_fails_without_network_call() {
        let server = MockServer::start(vec![MockResponse::json(401, json!({}))]).await;
        let client = client_for(&server, MemoryTokenStorage::with_tokens(Some("access-1"), None));

        let error = client
            .request::<Value>(Method::GET, "/api/notes", None)
            .await
            .unwrap_err();

        assert_eq!(error, ApiError::AuthenticationFailed);
        assert_eq!(server.requests().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_401s_share_one_refresh() {
        let server = MockServer::start(vec![
            MockResponse::json(401, json!({})).delayed(50),
            MockResponse::json(401, json!({})).delayed(50),
            MockResponse::json(200, json!({ "access_token": "access-2" })).delayed(50),
            MockResponse::json(200, json!({ "n": 1 })),
            MockResponse::json(200, json!({ "n": 2 })),
        ])
        .await;
        let storage = MemoryTokenStorage::with_tokens(Some("access-1"), Some("refresh-1"));
        let client = client_for(&server, storage);

        let (first, second) = tokio::join!(
            client.request::<Value>(Method::GET, "/api/notes", None),
            client.request::<Value>(Method::GET, "/api/notes/public", None),
        );

        assert!(first.is_ok());
        assert!(second.is_ok());
        let refreshes = server
            .requests()
            .iter()
            .filter(|request| request.path == REFRESH_ENDPOINT)
            .count();
        assert_eq!(refreshes, 1);
    }

    #[tokio::test]
    async fn stream_sse_dispatches_payloads_and_skips_garbage() {
        let server = MockServer::start(vec![MockResponse::event_stream(vec![
            "data: {\"question\":\"Q1\",\"answer\":\"A1\"}\n\ndata: {bro",
            "ken}\n\ndata: {\"question\":\"Q2\",",
            "\"answer\":\"A2\"}\n\n",
        ])])
        .await;
        let client = client_for(&server, MemoryTokenStorage::with_tokens(Some("access-1"), None));

        let mut received = Vec::new();
        client
            .stream_sse("/api/notes/flashcard/query", json!({ "query": "rust" }), |payload| {
                received.push(payload);
            })
            .await
            .unwrap();

        assert_eq!(
            received,
            vec![
                json!({ "question": "Q1", "answer": "A1" }),
                json!({ "question": "Q2", "answer": "A2" }),
            ]
        );
        let requests = server.requests();
        assert_eq!(requests[0].method, "POST");
        assert_eq!(
            serde_json::from_str::<Value>(&requests[0].body).unwrap(),
            json!({ "query": "rust" })
        );
    }

    #[tokio::test]
    async fn stream_sse_refreshes_before_parsing() {
        let server = MockServer::start(vec![
            MockResponse::json(401, json!({})),
            MockResponse::json(200, json!({ "access_token": "access-2" })),
            MockResponse::event_stream(vec!["data: {\"n\":1}\n\n"]),
        ])
        .await;
        let storage = MemoryTokenStorage::with_tokens(Some("access-1"), Some("refresh-1"));
        let client = client_for(&server, storage);

        let count = AtomicUsize::new(0);
        client
            .stream_sse("/api/notes/flashcard/notes", json!({ "note_ids": [] }), |_| {
                count.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(server.requests()[2].authorization.as_deref(), Some("Bearer access-2"));
    }

    #[tokio::test]
    async fn stream_sse_reports_error_status_text() {
        let server = MockServer::start(vec![MockResponse::text(503, "generator offline")]).await;
        let client = client_for(&server, MemoryTokenStorage::new());

        let error = client
            .stream_sse("/api/notes/flashcard/query", json!({ "query": "q" }), |_| {})
            .await
            .unwrap_err();
        assert_eq!(
            error,
            ApiError::Http {
                status: 503,
                message: "generator offline".to_string()
            }
        );
    }

    #[tokio::test]
    async fn stream_sse_keeps_long_error_bodies_whole() {
        let body = format!("upstream trace:\n{}", "frame at generator::run\n".repeat(20));
        let server = MockServer::start(vec![MockResponse::text(503, &body)]).await;
        let client = client_for(&server, MemoryTokenStorage::new());

        let error = client
            .stream_sse("/api/notes/flashcard/query", json!({ "query": "q" }), |_| {})
            .await
            .unwrap_err();
        assert!(body.len() > 300);
        assert_eq!(
            error,
            ApiError::Http {
                status: 503,
                message: body
            }
        );
    }

    #[tokio::test]
    async fn spawned_stream_reports_failure_as_error_payload() {
        let server = MockServer::start(vec![MockResponse::empty(500)]).await;
        let client = client_for(&server, MemoryTokenStorage::new());

        let received = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let handle = client.spawn_stream(
            "/api/notes/flashcard/query",
            json!({ "query": "q" }),
            move |payload| sink.lock().unwrap().push(payload),
        );
        assert!(handle.finished().await);

        assert_eq!(
            *received.lock().unwrap(),
            vec![json!({ "type": "error", "error": "HTTP 500" })]
        );
    }
}
