//! Prompt construction for claim verification

use crate::verification::VerificationRequest;

/// System instruction sent with every verification prompt
pub const SYSTEM_INSTRUCTION: &str = "You are a sustainability verification expert analyzing claims for accuracy, credibility, and alignment with ESG standards.";

/// Builds the user prompt for a verification request
pub struct PromptBuilder<'a> {
    request: &'a VerificationRequest,
}

impl<'a> PromptBuilder<'a> {
    /// Create a prompt builder for the given request
    pub fn new(request: &'a VerificationRequest) -> Self {
        Self { request }
    }

    /// Build the complete prompt
    pub fn build(&self) -> String {
        let mut prompt = format!(
            "Verify this sustainability claim: \"{}\"",
            self.request.claim
        );

        if let Some(context) = self.request.context.as_deref().filter(|c| !c.is_empty()) {
            prompt.push_str("\n\nContext: ");
            prompt.push_str(context);
        }

        prompt
    }

    /// The fixed system instruction
    pub fn system_instruction(&self) -> &'static str {
        SYSTEM_INSTRUCTION
    }
}
