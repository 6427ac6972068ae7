//! TaC Engine LLM Provider Layer
//!
//! Upstream text-generation providers behind the [`TextGenerator`] trait.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `GeminiProvider`: Google Gemini `generateContent` integration
//!
//! The API key is passed per call so that a missing credential can be
//! rejected before any provider is touched.
//!
//! # Examples
//!
//! ```
//! use tac_llm::{MockProvider, TextGenerator};
//!
//! # tokio_test::block_on(async {
//! let provider = MockProvider::new("Hello from LLM!");
//! let result = provider.generate("key", "test prompt", "system").await.unwrap();
//! assert_eq!(result.text, "Hello from LLM!");
//! # });
//! ```

#![warn(missing_docs)]

pub mod gemini;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tac_domain::{Source, VerificationResult};
use thiserror::Error;

pub use gemini::{GeminiConfig, GeminiProvider, SamplingParams};

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or transport failure, carrying the client's message verbatim
    #[error("{0}")]
    Communication(String),

    /// Non-success HTTP status from the upstream API
    #[error("Upstream returned HTTP {status}: {message}")]
    Upstream {
        /// HTTP status code
        status: u16,
        /// Error message reported by the upstream API
        message: String,
    },

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit or quota exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Model not available (HTTP 404)
    #[error("Model {model} not available: {message}")]
    ModelNotAvailable {
        /// Configured model name
        model: String,
        /// Error message reported by the upstream API
        message: String,
    },

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

/// Trait for upstream text generation
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a justification for `prompt` under `system_instruction`
    async fn generate(
        &self,
        api_key: &str,
        prompt: &str,
        system_instruction: &str,
    ) -> Result<VerificationResult, LlmError>;
}

#[derive(Debug, Clone)]
enum MockReply {
    Result(VerificationResult),
    Error(String),
}

/// Mock LLM provider for deterministic testing
///
/// Returns pre-configured responses without making any network calls.
///
/// # Examples
///
/// ```
/// use tac_llm::{MockProvider, TextGenerator};
///
/// # tokio_test::block_on(async {
/// let mut provider = MockProvider::default();
/// provider.add_response("prompt1", "response1");
/// provider.add_error("prompt2", "fetch failed");
///
/// assert_eq!(provider.generate("k", "prompt1", "s").await.unwrap().text, "response1");
/// assert!(provider.generate("k", "prompt2", "s").await.is_err());
/// assert_eq!(provider.call_count(), 2);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_reply: MockReply,
    replies: Arc<Mutex<HashMap<String, MockReply>>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

/// A call observed by [`MockProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    /// API key passed in
    pub api_key: String,
    /// Prompt passed in
    pub prompt: String,
    /// System instruction passed in
    pub system_instruction: String,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self::with_result(VerificationResult::text_only(response))
    }

    /// Create a MockProvider answering every prompt with `result`
    pub fn with_result(result: VerificationResult) -> Self {
        Self {
            default_reply: MockReply::Result(result),
            replies: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a MockProvider whose every call fails with a communication error
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            default_reply: MockReply::Error(message.into()),
            ..Self::default()
        }
    }

    /// Create a MockProvider answering with text and cited sources
    pub fn with_sources(response: impl Into<String>, sources: Vec<Source>) -> Self {
        Self::with_result(VerificationResult::with_sources(response, sources))
    }

    /// Add a specific response for a given prompt
    pub fn add_response(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        lock(&self.replies).insert(
            prompt.into(),
            MockReply::Result(VerificationResult::text_only(response)),
        );
    }

    /// Configure a communication error for a specific prompt
    pub fn add_error(&mut self, prompt: impl Into<String>, message: impl Into<String>) {
        lock(&self.replies).insert(prompt.into(), MockReply::Error(message.into()));
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// All calls seen so far, oldest first
    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.calls).clone()
    }

    /// Reset the recorded calls
    pub fn reset_calls(&self) {
        lock(&self.calls).clear();
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl TextGenerator for MockProvider {
    async fn generate(
        &self,
        api_key: &str,
        prompt: &str,
        system_instruction: &str,
    ) -> Result<VerificationResult, LlmError> {
        lock(&self.calls).push(MockCall {
            api_key: api_key.to_string(),
            prompt: prompt.to_string(),
            system_instruction: system_instruction.to_string(),
        });

        let reply = lock(&self.replies)
            .get(prompt)
            .cloned()
            .unwrap_or_else(|| self.default_reply.clone());

        match reply {
            MockReply::Result(result) => Ok(result),
            MockReply::Error(message) => Err(LlmError::Communication(message)),
        }
    }
}
