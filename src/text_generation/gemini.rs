//! Google Generative Language (Gemini) API client.
//!
//! Only the single-turn `generateContent` call is used: one user prompt in,
//! the concatenated text parts of the first candidate out.
//!
//! # API Reference
//!
//! See: <https://ai.google.dev/api/generate-content>
//!
//! # Authentication
//!
//! Requires an API key, passed as the `key` query parameter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::TextGenerator;
use crate::error::ProviderError;

/// Base URL for the Generative Language API.
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used when none is configured.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    /// Create a new Gemini client.
    ///
    /// # Arguments
    ///
    /// * `api_key` - API key from Google AI Studio.
    /// * `model` - Model name, e.g. "gemini-2.5-flash".
    pub fn new(api_key: &str, model: &str) -> Self {
        Self::with_base_url(GEMINI_API_BASE, api_key, model)
    }

    /// Create a client with a custom base URL (for testing).
    pub fn with_base_url(base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    /// The model this client talks to.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url,
            urlencoding::encode(&self.model),
            urlencoding::encode(&self.api_key)
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self.client.post(self.endpoint()).json(&request).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<GeminiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|_| ProviderError::Empty)?;

        parsed.text().ok_or(ProviderError::Empty)
    }
}

// ============================================================================
// Request / response types
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

/// A content block: a list of parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// A single text part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

/// Response body of `generateContent`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// One generated candidate.
#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, or `None` if it is missing or blank.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts.iter().map(|p| p.text.as_str()).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::StatusCode, routing::post};
    use serde_json::json;
    use tokio::net::TcpListener;

    /// Serve `router` on an ephemeral port and return its base URL.
    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_text_joins_parts_of_first_candidate() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                { "content": { "parts": [{ "text": "### General" }, { "text": " Advice" }] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        }))
        .unwrap();

        assert_eq!(response.text().as_deref(), Some("### General Advice"));
    }

    #[test]
    fn test_blank_text_is_none() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "  \n" }] } }]
        }))
        .unwrap();
        assert!(response.text().is_none());

        let empty: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert!(empty.text().is_none());
    }

    #[test]
    fn test_endpoint_encodes_key() {
        let client = GeminiClient::with_base_url("http://localhost/", "a b", "gemini-2.5-flash");
        assert_eq!(
            client.endpoint(),
            "http://localhost/models/gemini-2.5-flash:generateContent?key=a%20b"
        );
    }

    #[tokio::test]
    async fn test_generate_returns_candidate_text() {
        let router = Router::new().route(
            "/models/:model",
            post(|| async {
                Json(json!({
                    "candidates": [{ "content": { "parts": [{ "text": "### General Advice\n* Wear a mask." }] } }]
                }))
            }),
        );
        let base = serve(router).await;

        let client = GeminiClient::with_base_url(&base, "key", DEFAULT_GEMINI_MODEL);
        let text = client.generate("prompt").await.unwrap();

        assert_eq!(text, "### General Advice\n* Wear a mask.");
    }

    #[tokio::test]
    async fn test_generate_maps_error_status() {
        let router = Router::new().route(
            "/models/:model",
            post(|| async {
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({ "error": { "code": 429, "message": "Quota exceeded" } })),
                )
            }),
        );
        let base = serve(router).await;

        let client = GeminiClient::with_base_url(&base, "key", DEFAULT_GEMINI_MODEL);
        let err = client.generate("prompt").await.unwrap_err();

        match err {
            ProviderError::Status { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "Quota exceeded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_generate_empty_candidates_is_error() {
        let router = Router::new().route(
            "/models/:model",
            post(|| async { Json(json!({ "candidates": [] })) }),
        );
        let base = serve(router).await;

        let client = GeminiClient::with_base_url(&base, "key", DEFAULT_GEMINI_MODEL);
        assert!(matches!(
            client.generate("prompt").await,
            Err(ProviderError::Empty)
        ));
    }
}
