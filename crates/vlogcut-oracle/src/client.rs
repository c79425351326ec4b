//! Gemini HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{OracleError, OracleResult};
use crate::oracle::{CompletionRequest, TextModel};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Configuration for the oracle client.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// API key; the oracle is disabled when absent
    pub api_key: Option<String>,
    /// Base URL of the generative language API
    pub base_url: String,
    /// Model used to rank candidate moments
    pub rank_model: String,
    /// Model used to caption intervals
    pub describe_model: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Total attempts per call (including the first)
    pub max_attempts: u32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            rank_model: "gemini-2.5-flash".to_string(),
            describe_model: "gemini-2.5-flash-lite".to_string(),
            timeout: Duration::from_secs(60),
            max_attempts: 3,
        }
    }
}

impl OracleConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            base_url: std::env::var("ORACLE_BASE_URL").unwrap_or(defaults.base_url),
            rank_model: std::env::var("ORACLE_RANK_MODEL").unwrap_or(defaults.rank_model),
            describe_model: std::env::var("ORACLE_DESCRIBE_MODEL")
                .unwrap_or(defaults.describe_model),
            timeout: Duration::from_secs(
                std::env::var("ORACLE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            max_attempts: attempts_for_retries(
                std::env::var("ORACLE_MAX_RETRIES")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2),
            ),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

/// `ORACLE_MAX_RETRIES` counts retries after the first attempt.
fn attempts_for_retries(retries: u32) -> u32 {
    retries.saturating_add(1)
}

/// Gemini API request.
#[derive(Debug, Serialize)]
struct GeminiRequest {
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

/// Gemini API response.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

/// Gemini `generateContent` client.
pub struct GeminiClient {
    http: Client,
    api_key: String,
    base_url: String,
    timeout_secs: u64,
}

impl GeminiClient {
    /// Create a client; fails with `Unavailable` when no API key is configured.
    pub fn new(config: &OracleConfig) -> OracleResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| OracleError::unavailable("GEMINI_API_KEY not set"))?;

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(OracleError::Network)?;

        Ok(Self {
            http,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_secs: config.timeout.as_secs(),
        })
    }
}

#[async_trait]
impl TextModel for GeminiClient {
    async fn complete(&self, request: &CompletionRequest) -> OracleResult<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, request.model);

        let body = GeminiRequest {
            system_instruction: request.system.as_ref().map(|s| Content {
                parts: vec![Part { text: s.clone() }],
            }),
            contents: vec![Content {
                parts: vec![Part {
                    text: request.prompt.clone(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            },
        };

        debug!(model = %request.model, "Sending oracle request");

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::Timeout(self.timeout_secs)
                } else {
                    OracleError::Network(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            let message = format!("Gemini API returned {}: {}", status, error_text);
            // 4xx other than rate limiting will not improve on retry
            return if status.is_server_error() || status.as_u16() == 429 {
                Err(OracleError::request_failed(message))
            } else {
                Err(OracleError::unavailable(message))
            };
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| OracleError::invalid_response(format!("Failed to parse Gemini response: {}", e)))?;

        let text: String = gemini_response
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(OracleError::invalid_response("No content in Gemini response"));
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> OracleConfig {
        OracleConfig {
            api_key: Some("test-key".into()),
            base_url: server.uri(),
            ..Default::default()
        }
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "gemini-2.5-flash".into(),
            system: Some("You are a video editor.".into()),
            prompt: "Pick moments".into(),
            max_tokens: 600,
            temperature: 0.3,
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = OracleConfig::default();
        assert!(!config.is_enabled());
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.max_attempts, 3);
    }

    #[test]
    fn test_retries_exclude_first_attempt() {
        assert_eq!(attempts_for_retries(0), 1);
        assert_eq!(attempts_for_retries(3), 4);
        assert_eq!(attempts_for_retries(u32::MAX), u32::MAX);
    }

    #[test]
    fn test_client_requires_api_key() {
        let result = GeminiClient::new(&OracleConfig::default());
        assert!(matches!(result, Err(OracleError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_complete_joins_parts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash:generateContent"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "[{\"start\": "}, {"text": "1, \"end\": 5}]"}]}}]
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&config_for(&server)).unwrap();
        let text = client.complete(&request()).await.unwrap();
        assert_eq!(text, "[{\"start\": 1, \"end\": 5}]");
    }

    #[tokio::test]
    async fn test_server_error_is_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&config_for(&server)).unwrap();
        let err = client.complete(&request()).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_client_error_is_not_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad key"))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&config_for(&server)).unwrap();
        let err = client.complete(&request()).await.unwrap_err();
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_empty_candidates_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&config_for(&server)).unwrap();
        let err = client.complete(&request()).await.unwrap_err();
        assert!(matches!(err, OracleError::InvalidResponse(_)));
    }
}
