//! Gemini model client — talks to the Generative Language
//! `generateContent` REST endpoint via `reqwest`.
//!
//! The orchestrator's protocol is JSON-in-text, so every request asks for
//! `responseMimeType: "application/json"` and the reply is returned as raw
//! text for the response interpreter to parse.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use omnichat_core::config::ModelConfig;

use crate::traits::ModelClient;

/// Public Generative Language API base.
const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

// ─────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

// ─────────────────────────────────────────────
// GeminiClient
// ─────────────────────────────────────────────

/// HTTP client for the Gemini API.
pub struct GeminiClient {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl GeminiClient {
    /// Create a client from model configuration.
    ///
    /// Fails when no API key is configured (config field or
    /// `GEMINI_API_KEY` merged by the loader).
    pub fn new(config: &ModelConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            bail!("GEMINI_API_KEY not found in config or environment");
        }

        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(GeminiClient {
            client,
            api_base,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    /// Build the `generateContent` URL for this client's model.
    fn generate_url(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        format!("{}/models/{}:generateContent", base, self.model)
    }

    /// Extract the concatenated candidate text from a parsed response.
    fn response_text(response: GenerateResponse) -> Option<String> {
        let candidate = response.candidates.into_iter().next()?;
        let parts = candidate.content?.parts;
        let text: String = parts.into_iter().filter_map(|p| p.text).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text.trim().to_string())
        }
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> String {
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        debug!(model = %self.model, prompt_len = prompt.len(), "calling model");

        let result = self
            .client
            .post(self.generate_url())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await;

        let response = match result {
            Ok(resp) => resp,
            Err(e) => {
                error!(error = %e, "model HTTP request failed");
                return format!("Error generating response: {e}");
            }
        };

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            error!(status = %status, body = %error_text, "model API error");
            return format!("Error generating response: {status} — {error_text}");
        }

        match response.json::<GenerateResponse>().await {
            Ok(parsed) => match Self::response_text(parsed) {
                Some(text) => text,
                None => {
                    error!("model returned no candidate text");
                    "Error generating response: empty response from model".to_string()
                }
            },
            Err(e) => {
                error!(error = %e, "failed to parse model response");
                format!("Error generating response: {e}")
            }
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn display_name(&self) -> &str {
        "Gemini"
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_config(api_key: &str, api_base: Option<&str>) -> ModelConfig {
        ModelConfig {
            model: "gemini-2.0-flash".into(),
            api_key: api_key.into(),
            api_base: api_base.map(String::from),
            timeout_secs: 5,
        }
    }

    // ── Unit tests ──

    #[test]
    fn missing_api_key_fails_construction() {
        let err = GeminiClient::new(&make_config("", None)).unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn generate_url_shape() {
        let client = GeminiClient::new(&make_config("key", Some("https://example.com/v1beta/"))).unwrap();
        assert_eq!(
            client.generate_url(),
            "https://example.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn default_api_base_used() {
        let client = GeminiClient::new(&make_config("key", None)).unwrap();
        assert!(client.generate_url().starts_with(DEFAULT_API_BASE));
    }

    // ── Integration tests with mock server ──

    #[tokio::test]
    async fn generate_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-2.0-flash:generateContent"))
            .and(query_param("key", "test-key-123"))
            .and(body_partial_json(serde_json::json!({
                "generationConfig": {"responseMimeType": "application/json"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {
                        "parts": [{"text": "  {\"type\": \"reply\", \"text\": \"hi\"}  "}]
                    }
                }]
            })))
            .mount(&mock_server)
            .await;

        let client = GeminiClient::new(&make_config("test-key-123", Some(&mock_server.uri()))).unwrap();
        let text = client.generate("{\"messages\": []}").await;
        assert_eq!(text, "{\"type\": \"reply\", \"text\": \"hi\"}");
    }

    #[tokio::test]
    async fn generate_api_error_returns_text() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"message": "Resource exhausted"}
            })))
            .mount(&mock_server)
            .await;

        let client = GeminiClient::new(&make_config("key", Some(&mock_server.uri()))).unwrap();
        let text = client.generate("prompt").await;
        assert!(text.starts_with("Error generating response:"));
        assert!(text.contains("429"));
    }

    #[tokio::test]
    async fn generate_network_error_returns_text() {
        // Point to a port that's not listening.
        let client = GeminiClient::new(&make_config("key", Some("http://127.0.0.1:1"))).unwrap();
        let text = client.generate("prompt").await;
        assert!(text.starts_with("Error generating response:"));
    }

    #[tokio::test]
    async fn generate_malformed_body_returns_text() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
            .mount(&mock_server)
            .await;

        let client = GeminiClient::new(&make_config("key", Some(&mock_server.uri()))).unwrap();
        let text = client.generate("prompt").await;
        assert!(text.starts_with("Error generating response:"));
    }

    #[tokio::test]
    async fn generate_empty_candidates_returns_text() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})),
            )
            .mount(&mock_server)
            .await;

        let client = GeminiClient::new(&make_config("key", Some(&mock_server.uri()))).unwrap();
        let text = client.generate("prompt").await;
        assert!(text.contains("empty response"));
    }
}
