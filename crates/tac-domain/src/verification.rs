//! Verification request and result value objects

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A sustainability claim submitted for verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRequest {
    /// Free-text claim, never empty once constructed
    pub claim: String,

    /// Optional extra context appended to the prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl VerificationRequest {
    /// Create a request, returning `None` when the claim is empty
    ///
    /// # Examples
    ///
    /// ```
    /// use tac_domain::VerificationRequest;
    ///
    /// assert!(VerificationRequest::new("50 hectares restored").is_some());
    /// assert!(VerificationRequest::new("").is_none());
    /// ```
    pub fn new(claim: impl Into<String>) -> Option<Self> {
        let claim = claim.into();
        if claim.is_empty() {
            return None;
        }
        Some(Self {
            claim,
            context: None,
        })
    }

    /// Attach context; empty context is treated as absent
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        self.context = if context.is_empty() { None } else { Some(context) };
        self
    }
}

/// A cited source returned by a grounded generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Source URI
    pub uri: String,

    /// Human readable title (may be empty)
    pub title: String,
}

impl Source {
    /// Create a new source
    pub fn new(uri: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            title: title.into(),
        }
    }
}

/// Normalized output of a verification: model text plus cited sources
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Model justification text
    pub text: String,

    /// Cited sources, in citation order; empty when grounding is off
    #[serde(default)]
    pub sources: Vec<Source>,
}

impl VerificationResult {
    /// Create a result without sources
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sources: Vec::new(),
        }
    }

    /// Create a result with sources, deduplicating them by URI
    pub fn with_sources(text: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            text: text.into(),
            sources: dedup_sources(sources),
        }
    }
}

/// Remove sources with a URI already seen, keeping the first occurrence
///
/// Sources with an empty URI are dropped.
pub fn dedup_sources(sources: Vec<Source>) -> Vec<Source> {
    let mut seen = HashSet::new();
    sources
        .into_iter()
        .filter(|source| !source.uri.is_empty() && seen.insert(source.uri.clone()))
        .collect()
}
