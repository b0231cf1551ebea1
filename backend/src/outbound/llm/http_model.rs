//! Reqwest-backed chat-completions adapter for OpenAI-compatible providers.
//!
//! Requests are retried on timeouts, transport failures, throttling, and
//! server errors with jittered exponential backoff. Credential rejections
//! and client errors fail immediately.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, warn};

use super::dto::{ChatCompletionRequest, ChatCompletionResponse, OutboundMessage, OutboundTool};
use crate::domain::ports::{ChatModel, ChatModelError, Completion, CompletionRequest};

/// OpenRouter's OpenAI-compatible endpoint.
pub const DEFAULT_LLM_BASE_URL: &str = "https://openrouter.ai/api/v1";
/// Model requested when none is configured.
pub const DEFAULT_LLM_MODEL: &str = "openai/gpt-4o-mini";
const CHAT_COMPLETIONS_PATH: [&str; 2] = ["chat", "completions"];
const MAX_TOKENS: u32 = 1000;
const TEMPERATURE: f32 = 0.7;

/// Exponential backoff applied between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each one after.
    pub base_delay: Duration,
    /// Upper bound on a single delay before jitter.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based), plus up to 50% jitter.
    fn delay(&self, retry: u32) -> Duration {
        let base_ms = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        let cap_ms = u64::try_from(self.max_delay.as_millis()).unwrap_or(u64::MAX);
        let factor = 1_u64.checked_shl(retry.saturating_sub(1)).unwrap_or(u64::MAX);
        let delay_ms = base_ms.saturating_mul(factor).min(cap_ms);
        let jitter_ms = if delay_ms < 2 {
            0
        } else {
            rand::thread_rng().gen_range(0..=delay_ms / 2)
        };
        Duration::from_millis(delay_ms.saturating_add(jitter_ms))
    }
}

/// Provider identity and model selection.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_key: String,
    pub model: String,
    /// Sent as `HTTP-Referer` for provider attribution.
    pub site_url: Option<String>,
    /// Sent as `X-Title` for provider attribution.
    pub app_title: Option<String>,
    pub retry: RetryPolicy,
}

impl LlmSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_LLM_MODEL.to_owned(),
            site_url: None,
            app_title: None,
            retry: RetryPolicy::default(),
        }
    }
}

/// Errors raised while building the adapter.
#[derive(Debug, thiserror::Error)]
pub enum LlmSetupError {
    #[error("invalid header value for {header}")]
    InvalidHeader { header: &'static str },
    #[error("base url cannot carry a path: {url}")]
    InvalidBaseUrl { url: String },
    #[error(transparent)]
    Client(#[from] reqwest::Error),
}

/// Chat model adapter that POSTs to `{base}/chat/completions`.
pub struct OpenAiCompatibleChatModel {
    client: Client,
    endpoint: Url,
    model: String,
    retry: RetryPolicy,
}

fn header_value(value: &str, header: &'static str) -> Result<HeaderValue, LlmSetupError> {
    HeaderValue::from_str(value).map_err(|_| LlmSetupError::InvalidHeader { header })
}

impl OpenAiCompatibleChatModel {
    /// Build an adapter with default headers and an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when a header value is invalid, the base URL cannot
    /// be extended, or the reqwest client cannot be constructed.
    pub fn new(
        base_url: Url,
        timeout: Duration,
        settings: LlmSettings,
    ) -> Result<Self, LlmSetupError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            header_value(&format!("Bearer {}", settings.api_key), "authorization")?,
        );
        if let Some(site_url) = settings.site_url.as_deref() {
            headers.insert(
                HeaderName::from_static("http-referer"),
                header_value(site_url, "http-referer")?,
            );
        }
        if let Some(title) = settings.app_title.as_deref() {
            headers.insert(
                HeaderName::from_static("x-title"),
                header_value(title, "x-title")?,
            );
        }
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let mut endpoint = base_url.clone();
        endpoint
            .path_segments_mut()
            .map_err(|()| LlmSetupError::InvalidBaseUrl {
                url: base_url.to_string(),
            })?
            .pop_if_empty()
            .extend(CHAT_COMPLETIONS_PATH);

        Ok(Self {
            client,
            endpoint,
            model: settings.model,
            retry: settings.retry,
        })
    }

    async fn attempt(&self, payload: &ChatCompletionRequest<'_>) -> Result<Completion, ChatModelError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(payload)
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        let decoded: ChatCompletionResponse = serde_json::from_slice(body.as_ref())
            .map_err(|error| ChatModelError::decode(format!("invalid completion payload: {error}")))?;
        decoded
            .into_completion(&self.model)
            .map_err(ChatModelError::decode)
    }
}

#[async_trait]
impl ChatModel for OpenAiCompatibleChatModel {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, ChatModelError> {
        let tools = (!request.tools.is_empty())
            .then(|| request.tools.iter().map(OutboundTool::from).collect::<Vec<_>>());
        let payload = ChatCompletionRequest {
            model: self.model.as_str(),
            messages: request.messages.iter().map(OutboundMessage::from).collect(),
            tool_choice: tools.as_ref().map(|_| "auto"),
            tools,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let mut retry = 0;
        loop {
            match self.attempt(&payload).await {
                Ok(completion) => {
                    debug!(
                        model = %completion.model,
                        tool_calls = completion.tool_calls.len(),
                        "chat completion received"
                    );
                    return Ok(completion);
                }
                Err(error) if retry < self.retry.max_retries && is_retryable(&error) => {
                    retry += 1;
                    let delay = self.retry.delay(retry);
                    warn!(
                        %error,
                        retry,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "chat completion failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

fn is_retryable(error: &ChatModelError) -> bool {
    match error {
        ChatModelError::Timeout { .. }
        | ChatModelError::Transport { .. }
        | ChatModelError::RateLimited { .. } => true,
        ChatModelError::Upstream { status, .. } => *status >= 500,
        ChatModelError::Unauthorized { .. } | ChatModelError::Decode { .. } => false,
    }
}

fn map_transport_error(error: reqwest::Error) -> ChatModelError {
    if error.is_timeout() {
        ChatModelError::timeout(error.to_string())
    } else {
        ChatModelError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> ChatModelError {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ChatModelError::unauthorized(message),
        StatusCode::TOO_MANY_REQUESTS => ChatModelError::rate_limited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            ChatModelError::timeout(message)
        }
        _ => ChatModelError::upstream(status.as_u16(), message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{ChatMessage, ToolDefinition};
    use rstest::rstest;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn model(server: &MockServer, max_retries: u32) -> OpenAiCompatibleChatModel {
        let mut settings = LlmSettings::new("test-key");
        settings.model = "test/model".to_owned();
        settings.site_url = Some("http://localhost:3000".to_owned());
        settings.app_title = Some("Book Chat".to_owned());
        settings.retry = RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        };
        let base = Url::parse(&format!("{}/api/v1", server.uri())).expect("mock url");
        OpenAiCompatibleChatModel::new(base, Duration::from_secs(5), settings)
            .expect("adapter builds")
    }

    fn request(with_tools: bool) -> CompletionRequest {
        let tools = if with_tools {
            vec![ToolDefinition {
                name: "searchBooks".to_owned(),
                description: "Search the catalogue".to_owned(),
                parameters: json!({ "type": "object" }),
            }]
        } else {
            Vec::new()
        };
        CompletionRequest {
            messages: vec![ChatMessage::system("be helpful"), ChatMessage::user("hi")],
            tools,
        }
    }

    fn reply(content: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "id": "gen-1",
            "model": "test/model",
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
        }))
    }

    #[rstest]
    #[case::unauthorized(StatusCode::UNAUTHORIZED, false)]
    #[case::forbidden(StatusCode::FORBIDDEN, false)]
    #[case::bad_request(StatusCode::BAD_REQUEST, false)]
    #[case::rate_limited(StatusCode::TOO_MANY_REQUESTS, true)]
    #[case::gateway_timeout(StatusCode::GATEWAY_TIMEOUT, true)]
    #[case::server_error(StatusCode::BAD_GATEWAY, true)]
    fn only_transient_statuses_are_retried(#[case] status: StatusCode, #[case] retried: bool) {
        assert_eq!(is_retryable(&map_status_error(status, b"")), retried);
    }

    #[test]
    fn backoff_grows_and_respects_the_cap() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(300),
        };
        let first = policy.delay(1);
        let third = policy.delay(3);
        assert!(first >= Duration::from_millis(100) && first <= Duration::from_millis(150));
        assert!(third >= Duration::from_millis(300) && third <= Duration::from_millis(450));
    }

    #[tokio::test]
    async fn sends_attribution_headers_and_tools() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(header("http-referer", "http://localhost:3000"))
            .and(header("x-title", "Book Chat"))
            .and(body_partial_json(json!({
                "model": "test/model",
                "max_tokens": 1000,
                "tool_choice": "auto",
                "tools": [{ "type": "function", "function": { "name": "searchBooks" } }]
            })))
            .respond_with(reply("hello"))
            .expect(1)
            .mount(&server)
            .await;

        let completion = model(&server, 0)
            .complete(&request(true))
            .await
            .expect("completion succeeds");
        assert_eq!(completion.content.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn decodes_tool_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "test/model",
                "choices": [{ "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": { "name": "getBookDetails", "arguments": "{\"bookId\":\"B1\"}" }
                    }]
                } }]
            })))
            .mount(&server)
            .await;

        let completion = model(&server, 0)
            .complete(&request(true))
            .await
            .expect("completion succeeds");
        assert!(completion.content.is_none());
        let call = completion.tool_calls.first().expect("one tool call");
        assert_eq!(call.name, "getBookDetails");
        assert_eq!(call.arguments, r#"{"bookId":"B1"}"#);
    }

    #[tokio::test]
    async fn retries_server_errors_until_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(reply("recovered"))
            .expect(1)
            .mount(&server)
            .await;

        let completion = model(&server, 2)
            .complete(&request(false))
            .await
            .expect("third attempt succeeds");
        assert_eq!(completion.content.as_deref(), Some("recovered"));
    }

    #[tokio::test]
    async fn gives_up_after_the_retry_budget() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .expect(3)
            .mount(&server)
            .await;

        let error = model(&server, 2)
            .complete(&request(false))
            .await
            .expect_err("budget exhausted");
        assert!(matches!(error, ChatModelError::RateLimited { .. }));
    }

    #[tokio::test]
    async fn rejected_credentials_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .expect(1)
            .mount(&server)
            .await;

        let error = model(&server, 2)
            .complete(&request(false))
            .await
            .expect_err("unauthorised");
        assert!(matches!(error, ChatModelError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn omits_tools_when_none_are_offered() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(reply("final"))
            .mount(&server)
            .await;

        model(&server, 0)
            .complete(&request(false))
            .await
            .expect("completion succeeds");

        let received = server.received_requests().await.expect("recording enabled");
        let body: serde_json::Value =
            serde_json::from_slice(&received.first().expect("one request").body).expect("json");
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
    }
}
