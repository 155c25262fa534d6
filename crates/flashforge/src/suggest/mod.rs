//! AI-assisted card authoring.
//!
//! The suggestion service is an external text-completion call: it takes the
//! text typed so far on one side of a card and returns a single suggestion.
//! The call is made once; failures are reported to the caller and never
//! retried.
//!
//! ```no_run
//! # async fn demo() -> flashforge::Result<()> {
//! use flashforge::card::CardSide;
//! use flashforge::suggest::{apply_suggestion, assist, AssistMode, HttpSuggestionClient};
//!
//! let client = HttpSuggestionClient::from_config(&flashforge::Config::load()?)?;
//! let typed = "Mitochondria";
//! let suggestion = assist(&client, CardSide::Front, typed).await?;
//! let front = apply_suggestion(typed, &suggestion, AssistMode::Append);
//! # let _ = front;
//! # Ok(())
//! # }
//! ```

mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::card::CardSide;
use crate::error::{Error, Result};

pub use http::HttpSuggestionClient;

/// Input of a suggestion call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionRequest {
    /// The text to generate suggestions for.
    pub query: String,
}

impl SuggestionRequest {
    /// Create a request for `query`.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }

    /// Check the request before it is sent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SuggestionInput`] if the query is empty.
    pub fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() {
            return Err(Error::SuggestionInput {
                message: "query must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Output of a suggestion call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionResponse {
    /// The generated suggestion text.
    pub suggestions: String,
}

/// A text-suggestion provider.
#[async_trait]
pub trait SuggestionService: Send + Sync {
    /// Provider name, for logging.
    fn name(&self) -> &'static str;

    /// Generate a suggestion for the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is invalid or the call fails.
    async fn suggest(&self, request: &SuggestionRequest) -> Result<SuggestionResponse>;
}

/// How a suggestion is merged into the text already typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssistMode {
    /// Keep the typed text and add the suggestion after a blank line.
    #[default]
    Append,
    /// Discard the typed text.
    Replace,
}

/// Merge a suggestion into the current text of a card side.
#[must_use]
pub fn apply_suggestion(current: &str, suggestion: &str, mode: AssistMode) -> String {
    match mode {
        AssistMode::Append => format!("{current}\n\n{suggestion}"),
        AssistMode::Replace => suggestion.to_string(),
    }
}

/// Build the prompt sent to the provider for a query.
#[must_use]
pub fn render_prompt(query: &str) -> String {
    format!(
        "You help people write study flashcards.\n\
         Based on the text below, suggest relevant and useful content the user \
         could put on their flashcard. Reply with the suggestion only.\n\n\
         Text: {query}\n\
         Suggestion:"
    )
}

/// Ask `service` for a suggestion based on the text typed on one card side.
///
/// # Errors
///
/// Returns [`Error::SuggestionInput`] if nothing has been typed on that side
/// yet, or the service's error if the call fails.
pub async fn assist<S>(service: &S, side: CardSide, text: &str) -> Result<String>
where
    S: SuggestionService + ?Sized,
{
    if text.trim().is_empty() {
        return Err(Error::SuggestionInput {
            message: format!("type something on the {side} side first"),
        });
    }

    let request = SuggestionRequest::new(text);
    debug!("Requesting {} suggestion from {}", side, service.name());

    match service.suggest(&request).await {
        Ok(response) => Ok(response.suggestions),
        Err(err) => {
            warn!("Suggestion call to {} failed: {}", service.name(), err);
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Echoes the query back, counting calls.
    #[derive(Debug, Default)]
    struct EchoService {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SuggestionService for EchoService {
        fn name(&self) -> &'static str {
            "echo"
        }

        async fn suggest(&self, request: &SuggestionRequest) -> Result<SuggestionResponse> {
            request.validate()?;
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(SuggestionResponse {
                suggestions: format!("about {}", request.query),
            })
        }
    }

    /// Always fails, counting calls.
    #[derive(Debug, Default)]
    struct FailingService {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SuggestionService for FailingService {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn suggest(&self, _request: &SuggestionRequest) -> Result<SuggestionResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::suggestion("provider unavailable"))
        }
    }

    #[test]
    fn test_request_validate() {
        assert!(SuggestionRequest::new("cells").validate().is_ok());
        assert!(matches!(
            SuggestionRequest::new(" \n").validate().unwrap_err(),
            Error::SuggestionInput { .. }
        ));
    }

    #[test]
    fn test_schema_field_names() {
        let request = serde_json::to_value(SuggestionRequest::new("q")).unwrap();
        assert_eq!(request, serde_json::json!({ "query": "q" }));

        let response: SuggestionResponse =
            serde_json::from_str(r#"{"suggestions":"s"}"#).unwrap();
        assert_eq!(response.suggestions, "s");
    }

    #[test]
    fn test_response_schema_rejects_missing_field() {
        assert!(serde_json::from_str::<SuggestionResponse>(r#"{"text":"s"}"#).is_err());
    }

    #[test]
    fn test_apply_suggestion_append() {
        assert_eq!(
            apply_suggestion("Mitochondria", "Powerhouse of the cell", AssistMode::Append),
            "Mitochondria\n\nPowerhouse of the cell"
        );
    }

    #[test]
    fn test_apply_suggestion_replace() {
        assert_eq!(
            apply_suggestion("Mito", "Mitochondria", AssistMode::Replace),
            "Mitochondria"
        );
    }

    #[test]
    fn test_assist_mode_default() {
        assert_eq!(AssistMode::default(), AssistMode::Append);
    }

    #[test]
    fn test_render_prompt_includes_query() {
        let prompt = render_prompt("Krebs cycle");
        assert!(prompt.contains("Text: Krebs cycle"));
        assert!(prompt.ends_with("Suggestion:"));
    }

    #[tokio::test]
    async fn test_assist_returns_suggestion() {
        let service = EchoService::default();
        let suggestion = assist(&service, CardSide::Front, "osmosis").await.unwrap();

        assert_eq!(suggestion, "about osmosis");
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_assist_empty_text_skips_call() {
        let service = EchoService::default();
        let err = assist(&service, CardSide::Back, "   ").await.unwrap_err();

        assert!(err.to_string().contains("back side"));
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_assist_failure_is_not_retried() {
        let service = FailingService::default();
        let err = assist(&service, CardSide::Front, "osmosis").await.unwrap_err();

        assert!(err.is_suggestion_error());
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_assist_through_trait_object() {
        let service: Box<dyn SuggestionService> = Box::new(EchoService::default());
        let suggestion = assist(service.as_ref(), CardSide::Back, "diffusion")
            .await
            .unwrap();
        assert_eq!(suggestion, "about diffusion");
    }
}
