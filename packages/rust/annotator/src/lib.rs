//! External annotation capability.
//!
//! The pipeline talks to the language model through the narrow [`Annotator`]
//! trait so extraction logic stays testable against scripted responses. The
//! production implementation is [`OpenAiAnnotator`], a thin client for the
//! chat-completions API.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use bookbinder_shared::{BookbinderError, Result};

/// Request timeout. The annotation contract defines no timeout on success,
/// but an unbounded wait would stall the whole run on a hung connection.
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Max response-body characters echoed into error messages.
const ERROR_BODY_LIMIT: usize = 200;

// ---------------------------------------------------------------------------
// Annotator trait
// ---------------------------------------------------------------------------

/// A request/response text-completion capability.
///
/// One call per request: implementations must not retry internally, and any
/// failure (auth, quota, transport) surfaces as
/// [`BookbinderError::Annotation`].
#[allow(async_fn_in_trait)]
pub trait Annotator {
    /// Submit a system instruction plus a user payload, returning the
    /// model's free-form text response.
    async fn submit(&self, system_instruction: &str, payload: &str) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Wire types (chat-completions API)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// OpenAI client
// ---------------------------------------------------------------------------

/// Chat-completions client for the OpenAI API.
///
/// The credential and model are constructor parameters: resolution happens
/// once at startup, never mid-pipeline.
#[derive(Debug, Clone)]
pub struct OpenAiAnnotator {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: Url,
}

impl OpenAiAnnotator {
    /// Create a client for `api_base` (e.g. `https://api.openai.com/v1`).
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        api_base: &str,
    ) -> Result<Self> {
        let endpoint = Url::parse(&format!(
            "{}/chat/completions",
            api_base.trim_end_matches('/')
        ))
        .map_err(|e| BookbinderError::config(format!("invalid API base URL '{api_base}': {e}")))?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("bookbinder/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| BookbinderError::annotation(format!("HTTP client build: {e}")))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
            endpoint,
        })
    }

    /// The resolved request endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl Annotator for OpenAiAnnotator {
    async fn submit(&self, system_instruction: &str, payload: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: system_instruction.into(),
                },
                ChatMessage {
                    role: "user".into(),
                    content: payload.into(),
                },
            ],
        };

        debug!(
            model = %self.model,
            payload_chars = payload.chars().count(),
            "submitting annotation request"
        );

        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| BookbinderError::annotation(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BookbinderError::annotation(format!("response read failed: {e}")))?;

        if !status.is_success() {
            return Err(BookbinderError::annotation(format!(
                "HTTP {status}: {}",
                truncate_chars(&body, ERROR_BODY_LIMIT)
            )));
        }

        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            BookbinderError::annotation(format!(
                "unexpected response shape: {e} (got: {})",
                truncate_chars(&body, ERROR_BODY_LIMIT)
            ))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| BookbinderError::annotation("response contained no completion text"))
    }
}

/// Char-safe prefix for error messages.
fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_serializes_correctly() {
        let request = ChatRequest {
            model: "gpt-4".into(),
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: "instruction".into(),
                },
                ChatMessage {
                    role: "user".into(),
                    content: "payload".into(),
                },
            ],
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""model":"gpt-4""#));
        assert!(json.contains(r#""role":"system""#));
        assert!(json.contains(r#""content":"payload""#));
    }

    #[test]
    fn chat_response_deserializes() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"Título: El Libro"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("Título: El Libro")
        );
    }

    #[test]
    fn chat_response_tolerates_null_content() {
        let json = r#"{"choices":[{"message":{"content":null}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let client =
            OpenAiAnnotator::new("sk-test", "gpt-4", "https://api.openai.com/v1/").unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn invalid_api_base_is_config_error() {
        let result = OpenAiAnnotator::new("sk-test", "gpt-4", "not a url");
        assert!(matches!(
            result.unwrap_err(),
            BookbinderError::Config { .. }
        ));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("capítulo", 4), "capí");
        assert_eq!(truncate_chars("ok", 200), "ok");
    }
}
