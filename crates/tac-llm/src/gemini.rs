//! Gemini Provider Implementation
//!
//! Talks to the Google Generative Language REST API (`generateContent`).
//!
//! # Features
//!
//! - Async HTTP communication with a shared `reqwest::Client`
//! - Configurable endpoint, model and sampling parameters
//! - Optional Google Search grounding with source extraction
//! - Timeout handling; failures are returned, never retried
//!
//! # Examples
//!
//! ```no_run
//! use tac_llm::{GeminiConfig, GeminiProvider, TextGenerator};
//!
//! # async fn demo() -> Result<(), tac_llm::LlmError> {
//! let provider = GeminiProvider::new(GeminiConfig::default())?;
//! let result = provider
//!     .generate("my-api-key", "Verify this sustainability claim: \"...\"", "You are an expert.")
//!     .await?;
//! println!("{}", result.text);
//! # Ok(())
//! # }
//! ```

use crate::{LlmError, TextGenerator};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tac_domain::{Source, VerificationResult};
use tracing::{debug, warn};

/// Default Gemini API base URL
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Default model
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

/// Default timeout for generation requests (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Header carrying the API key
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Sampling parameters sent as `generationConfig`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingParams {
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus sampling threshold
    pub top_p: f32,
    /// Top-k cutoff
    pub top_k: u32,
    /// Maximum output tokens
    pub max_output_tokens: u32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 1024,
        }
    }
}

/// Configuration of a [`GeminiProvider`]
#[derive(Debug, Clone, PartialEq)]
pub struct GeminiConfig {
    /// API base URL, without trailing slash
    pub api_base: String,
    /// Model name
    pub model: String,
    /// Sampling parameters
    pub sampling: SamplingParams,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Attach the Google Search tool and collect cited sources
    pub grounding: bool,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            sampling: SamplingParams::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            grounding: false,
        }
    }
}

/// Gemini API provider
pub struct GeminiProvider {
    config: GeminiConfig,
    client: reqwest::Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: SamplingParams,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Serialize)]
struct GoogleSearch {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    #[serde(default)]
    web: Option<WebChunk>,
}

#[derive(Debug, Deserialize)]
struct WebChunk {
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: GeminiConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Provider configuration
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// URL of the `generateContent` endpoint for the configured model
    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            self.config.model
        )
    }

    fn build_request<'a>(
        &self,
        prompt: &'a str,
        system_instruction: &'a str,
    ) -> GenerateContentRequest<'a> {
        let tools = if self.config.grounding {
            vec![Tool {
                google_search: GoogleSearch {},
            }]
        } else {
            Vec::new()
        };

        GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![RequestPart {
                    text: system_instruction,
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: self.config.sampling,
            tools,
        }
    }

    async fn error_from_response(&self, response: reqwest::Response) -> LlmError {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|envelope| envelope.error.message)
            .unwrap_or(body);

        match status {
            reqwest::StatusCode::NOT_FOUND => LlmError::ModelNotAvailable {
                model: self.config.model.clone(),
                message,
            },
            reqwest::StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimitExceeded(message),
            _ => LlmError::Upstream {
                status: status.as_u16(),
                message,
            },
        }
    }
}

/// Turn a parsed response into a normalized result
fn into_result(response: GenerateContentResponse, grounding: bool) -> VerificationResult {
    let Some(candidate) = response.candidates.into_iter().next() else {
        warn!("Gemini returned no candidates");
        return VerificationResult::default();
    };

    if let Some(reason) = candidate.finish_reason.as_deref() {
        debug!("Gemini finish reason: {}", reason);
    }

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if !grounding {
        return VerificationResult::text_only(text);
    }

    let sources = candidate
        .grounding_metadata
        .map(|metadata| {
            metadata
                .grounding_chunks
                .into_iter()
                .filter_map(|chunk| chunk.web)
                .filter_map(|web| {
                    let uri = web.uri?;
                    Some(Source::new(uri, web.title.unwrap_or_default()))
                })
                .collect()
        })
        .unwrap_or_default();

    VerificationResult::with_sources(text, sources)
}

#[async_trait]
impl TextGenerator for GeminiProvider {
    async fn generate(
        &self,
        api_key: &str,
        prompt: &str,
        system_instruction: &str,
    ) -> Result<VerificationResult, LlmError> {
        let body = self.build_request(prompt, system_instruction);

        debug!(
            "Calling Gemini model {} (prompt {} chars, grounding {})",
            self.config.model,
            prompt.len(),
            self.config.grounding
        );

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Communication(e.to_string()))?;

        if !response.status().is_success() {
            return Err(self.error_from_response(response).await);
        }

        let parsed = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        Ok(into_result(parsed, self.config.grounding))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GeminiConfig::default();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.sampling.top_k, 40);
        assert_eq!(config.sampling.max_output_tokens, 1024);
        assert!(!config.grounding);
    }

    #[test]
    fn test_endpoint() {
        let provider = GeminiProvider::new(GeminiConfig {
            api_base: "http://localhost:8089/".to_string(),
            model: "test-model".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            provider.endpoint(),
            "http://localhost:8089/v1beta/models/test-model:generateContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let provider = GeminiProvider::new(GeminiConfig::default()).unwrap();
        let body = serde_json::to_value(provider.build_request("prompt", "system")).unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "system");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "prompt");
        assert_eq!(body["generationConfig"]["topK"], 40);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1024);
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_request_body_with_grounding() {
        let provider = GeminiProvider::new(GeminiConfig {
            grounding: true,
            ..Default::default()
        })
        .unwrap();
        let body = serde_json::to_value(provider.build_request("p", "s")).unwrap();
        assert!(body["tools"][0]["googleSearch"].is_object());
    }

    #[test]
    fn test_parse_text_parts_joined() {
        let json = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Part one. "}, {"text": "Part two."}]},
                "finishReason": "STOP"
            }]
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(json).unwrap();
        let result = into_result(parsed, false);
        assert_eq!(result.text, "Part one. Part two.");
        assert!(result.sources.is_empty());
    }

    #[test]
    fn test_parse_grounding_sources_deduplicated() {
        let json = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "Verified."}]},
                "groundingMetadata": {
                    "groundingChunks": [
                        {"web": {"uri": "https://a.example", "title": "A"}},
                        {"web": {"uri": "https://b.example"}},
                        {"web": {"uri": "https://a.example", "title": "A dup"}},
                        {"retrievedContext": {}}
                    ]
                }
            }]
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(json).unwrap();
        let result = into_result(parsed, true);
        assert_eq!(result.sources.len(), 2);
        assert_eq!(result.sources[0], Source::new("https://a.example", "A"));
        assert_eq!(result.sources[1], Source::new("https://b.example", ""));
    }

    #[test]
    fn test_sources_ignored_without_grounding() {
        let json = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "ok"}]},
                "groundingMetadata": {"groundingChunks": [{"web": {"uri": "https://a.example"}}]}
            }]
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert!(into_result(parsed, false).sources.is_empty());
    }

    #[test]
    fn test_parse_no_candidates() {
        let parsed: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#).unwrap();
        let result = into_result(parsed, false);
        assert!(result.text.is_empty());
    }

    #[tokio::test]
    async fn test_network_error() {
        // Nothing listens on port 1
        let provider = GeminiProvider::new(GeminiConfig {
            api_base: "http://127.0.0.1:1".to_string(),
            timeout_secs: 5,
            ..Default::default()
        })
        .unwrap();

        let result = provider.generate("key", "prompt", "system").await;
        match result {
            Err(LlmError::Communication(_)) => {} // Expected
            other => panic!("Expected Communication error, got {:?}", other),
        }
    }
}
