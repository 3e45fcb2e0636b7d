//! Brainrot transformation client.
//!
//! POSTs the user's text to the remote service and returns the converted
//! text with pictographs stripped. Any failure is absorbed into a fixed
//! fallback message, so callers always have something to show and speak.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::TransformConfig;

/// Shown and spoken when the service cannot be reached or misbehaves.
pub const FALLBACK_TEXT: &str = "Server go brrr... Try again later 💀.";

/// Used when the service answers without any text.
pub const PLACEHOLDER_TEXT: &str = "Server's doing the skibidi bop bop...";

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned status {0}")]
    Status(StatusCode),
}

#[derive(Debug)]
pub enum TransformOutcome {
    /// Blank input; the service was not called.
    Empty,
    Converted(String),
    Fallback { text: String, error: TransformError },
}

impl TransformOutcome {
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Empty => None,
            Self::Converted(text) | Self::Fallback { text, .. } => Some(text),
        }
    }
}

#[derive(Serialize)]
struct TransformRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct TransformResponse {
    brainrot: Option<String>,
}

#[derive(Clone)]
pub struct TransformClient {
    endpoint: String,
    client: Client,
}

impl TransformClient {
    pub fn new(config: &TransformConfig) -> Result<Self, TransformError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn transform(&self, text: &str) -> TransformOutcome {
        if text.trim().is_empty() {
            return TransformOutcome::Empty;
        }

        debug!("Sending {} chars to {}", text.chars().count(), self.endpoint);

        match self.request(text).await {
            Ok(raw) => {
                let cleaned = strip_emojis(&raw);
                debug!("Service output: '{cleaned}'");
                TransformOutcome::Converted(cleaned)
            }
            Err(error) => {
                match &error {
                    TransformError::Http(e) if e.is_connect() => {
                        warn!("Cannot connect to {}", self.endpoint)
                    }
                    TransformError::Http(e) if e.is_timeout() => warn!("Transform request timed out"),
                    TransformError::Http(e) if e.is_decode() => {
                        warn!("Failed to parse transform response: {e}")
                    }
                    other => warn!("Transform request failed: {other}"),
                }
                TransformOutcome::Fallback {
                    text: FALLBACK_TEXT.to_string(),
                    error,
                }
            }
        }
    }

    async fn request(&self, text: &str) -> Result<String, TransformError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&TransformRequest { text })
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(TransformError::Status(resp.status()));
        }

        let body: TransformResponse = resp.json().await?;
        Ok(body
            .brainrot
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| PLACEHOLDER_TEXT.to_string()))
    }
}

fn is_pictograph(c: char) -> bool {
    matches!(
        c,
        '\u{1F600}'..='\u{1F6FF}'
            | '\u{1F300}'..='\u{1F5FF}'
            | '\u{1F900}'..='\u{1F9FF}'
            | '\u{2600}'..='\u{26FF}'
            | '\u{2700}'..='\u{27BF}'
    )
}

/// Drop emoji and dingbat code points. Everything else, including
/// whitespace around them, is kept.
pub fn strip_emojis(text: &str) -> String {
    text.chars().filter(|&c| !is_pictograph(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode as HttpStatus;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/api/brainrot/")
    }

    fn client(endpoint: String) -> TransformClient {
        TransformClient::new(&TransformConfig {
            endpoint,
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn strips_emoji_ranges_only() {
        assert_eq!(strip_emojis("yo fr fr 💀"), "yo fr fr ");
        assert_eq!(strip_emojis("🤪 sigma ☀ ✂ 🚀 rizz"), " sigma    rizz");
        assert_eq!(strip_emojis("ünïcödé stays"), "ünïcödé stays");
    }

    #[tokio::test]
    async fn converts_and_cleans_response() {
        let app = Router::new().route(
            "/api/brainrot/",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body, json!({ "text": "hello there" }));
                Json(json!({ "brainrot": "yo fr fr 💀" }))
            }),
        );
        let client = client(serve(app).await);

        match client.transform("hello there").await {
            TransformOutcome::Converted(text) => assert_eq!(text, "yo fr fr "),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_field_uses_placeholder() {
        let app = Router::new().route("/api/brainrot/", post(|| async { Json(json!({})) }));
        let client = client(serve(app).await);

        let outcome = client.transform("hello").await;
        assert!(matches!(outcome, TransformOutcome::Converted(_)));
        assert_eq!(outcome.text(), Some(PLACEHOLDER_TEXT));
    }

    #[tokio::test]
    async fn server_error_falls_back() {
        let app = Router::new().route(
            "/api/brainrot/",
            post(|| async { (HttpStatus::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let client = client(serve(app).await);

        match client.transform("hello").await {
            TransformOutcome::Fallback { text, error } => {
                assert_eq!(text, FALLBACK_TEXT);
                assert!(matches!(error, TransformError::Status(s) if s.as_u16() == 500));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_falls_back() {
        let app = Router::new().route("/api/brainrot/", post(|| async { "not json" }));
        let client = client(serve(app).await);

        let outcome = client.transform("hello").await;
        assert!(matches!(outcome, TransformOutcome::Fallback { .. }));
        assert_eq!(outcome.text(), Some(FALLBACK_TEXT));
    }

    #[tokio::test]
    async fn unreachable_service_falls_back() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let outcome = client(format!("http://{addr}/")).transform("hello").await;
        assert_eq!(outcome.text(), Some(FALLBACK_TEXT));
    }

    #[tokio::test]
    async fn blank_input_skips_the_request() {
        let client = client("http://127.0.0.1:9/unused".into());
        assert!(matches!(client.transform("   \n").await, TransformOutcome::Empty));
        assert_eq!(client.transform("").await.text(), None);
    }
}
