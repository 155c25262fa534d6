//! Chat-completions HTTP provider for suggestions.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{render_prompt, SuggestionRequest, SuggestionResponse, SuggestionService};
use crate::config::Config;
use crate::error::{Error, Result};

/// Suggestion provider speaking the OpenAI-compatible chat-completions API.
#[derive(Debug, Clone)]
pub struct HttpSuggestionClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl HttpSuggestionClient {
    /// Create a client for `endpoint` using `model`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        max_tokens: u32,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("flashforge/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key,
            max_tokens,
        })
    }

    /// Create a client from the `[suggest]` configuration section.
    ///
    /// The API key is read from the environment variable named by
    /// `suggest.api_key_env`; a missing key is allowed for local providers.
    ///
    /// # Errors
    ///
    /// Returns an error if suggestions are disabled or the client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        if !config.suggest.enabled {
            return Err(Error::suggestion("suggestions are disabled in configuration"));
        }
        Self::new(
            config.suggest.endpoint.clone(),
            config.suggest.model.clone(),
            config.suggest_api_key(),
            config.suggest.max_tokens,
        )
    }

    /// The endpoint requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_request(&self, request: &SuggestionRequest) -> ChatRequest<'_> {
        ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: render_prompt(&request.query),
            }],
            max_tokens: self.max_tokens,
        }
    }
}

#[async_trait]
impl SuggestionService for HttpSuggestionClient {
    fn name(&self) -> &'static str {
        "chat-completions"
    }

    async fn suggest(&self, request: &SuggestionRequest) -> Result<SuggestionResponse> {
        request.validate()?;

        let body = self.build_request(request);
        debug!("Sending suggestion request to {}", self.endpoint);

        let mut builder = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(error_from_status(status, &text));
        }
        parse_response(&text)
    }
}

fn parse_response(body: &str) -> Result<SuggestionResponse> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| Error::suggestion(format!("unreadable provider response: {e}")))?;

    let suggestions = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| Error::suggestion("provider returned no suggestion"))?;

    Ok(SuggestionResponse { suggestions })
}

fn error_from_status(status: StatusCode, body: &str) -> Error {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(api) => Error::suggestion(format!("provider error ({status}): {}", api.error.message)),
        Err(_) => Error::suggestion(format!("provider returned status {status}")),
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    fn client(endpoint: &str) -> HttpSuggestionClient {
        HttpSuggestionClient::new(endpoint, "test-model", Some("sk-test".to_string()), 64).unwrap()
    }

    /// Serve one canned HTTP response and hand back the raw request.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request_complete(&request) {
                    break;
                }
            }

            let response = format!(
                "{status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });

        (format!("http://{addr}/v1/chat/completions"), handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        raw.len() >= header_end + 4 + content_length
    }

    #[test]
    fn test_build_request() {
        let client = client("http://localhost/v1/chat/completions");
        let body = serde_json::to_value(client.build_request(&SuggestionRequest::new("enzymes"))).unwrap();

        assert_eq!(body["model"], "test-model");
        assert_eq!(body["max_tokens"], 64);
        assert_eq!(body["messages"][0]["role"], "user");
        assert!(body["messages"][0]["content"]
            .as_str()
            .unwrap()
            .contains("enzymes"));
    }

    #[test]
    fn test_parse_response() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"  Catalysts  "}}]}"#;
        assert_eq!(parse_response(body).unwrap().suggestions, "Catalysts");
    }

    #[test]
    fn test_parse_response_without_choices() {
        let err = parse_response(r#"{"choices":[]}"#).unwrap_err();
        assert!(err.to_string().contains("no suggestion"));
    }

    #[test]
    fn test_parse_response_blank_content() {
        let body = r#"{"choices":[{"message":{"content":"   "}}]}"#;
        assert!(parse_response(body).is_err());
    }

    #[test]
    fn test_parse_response_not_json() {
        let err = parse_response("<html>").unwrap_err();
        assert!(err.to_string().contains("unreadable provider response"));
    }

    #[test]
    fn test_error_from_status_with_api_message() {
        let err = error_from_status(
            StatusCode::UNAUTHORIZED,
            r#"{"error":{"message":"invalid api key"}}"#,
        );
        let msg = err.to_string();
        assert!(msg.contains("401"));
        assert!(msg.contains("invalid api key"));
    }

    #[test]
    fn test_error_from_status_plain_body() {
        let err = error_from_status(StatusCode::BAD_GATEWAY, "upstream down");
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn test_from_config_disabled() {
        let mut config = Config::default();
        config.suggest.enabled = false;

        let err = HttpSuggestionClient::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("disabled"));
    }

    #[test]
    fn test_from_config_uses_endpoint() {
        let mut config = Config::default();
        config.suggest.endpoint = "http://127.0.0.1:9/v1/chat/completions".to_string();

        let client = HttpSuggestionClient::from_config(&config).unwrap();
        assert_eq!(client.endpoint(), "http://127.0.0.1:9/v1/chat/completions");
    }

    #[tokio::test]
    async fn test_suggest_success() {
        let (endpoint, server) = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"choices":[{"message":{"role":"assistant","content":"Site of cellular respiration"}}]}"#,
        )
        .await;

        let response = client(&endpoint)
            .suggest(&SuggestionRequest::new("Mitochondria"))
            .await
            .unwrap();
        assert_eq!(response.suggestions, "Site of cellular respiration");

        let raw_request = server.await.unwrap();
        assert!(raw_request.starts_with("POST /v1/chat/completions"));
        assert!(raw_request.to_ascii_lowercase().contains("authorization: bearer sk-test"));
        assert!(raw_request.contains("Mitochondria"));
    }

    #[tokio::test]
    async fn test_suggest_provider_error() {
        let (endpoint, server) = serve_once(
            "HTTP/1.1 429 Too Many Requests",
            r#"{"error":{"message":"rate limited"}}"#,
        )
        .await;

        let err = client(&endpoint)
            .suggest(&SuggestionRequest::new("Mitochondria"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("rate limited"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_suggest_rejects_empty_query_without_calling() {
        // Nothing listens on the discard port; validation must fail first.
        let err = client("http://127.0.0.1:9/v1/chat/completions")
            .suggest(&SuggestionRequest::new(""))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SuggestionInput { .. }));
    }
}
