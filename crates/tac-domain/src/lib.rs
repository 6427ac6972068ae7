//! TaC Engine Domain Layer
//!
//! Value objects, formulas and trait seams shared by the other crates.
//!
//! ## Key Concepts
//!
//! - **Claim**: free-text sustainability assertion submitted for verification
//! - **Verification result**: model justification plus cited sources
//! - **Risk profile**: mock financial state (rate, score, confidence, collateral)
//! - **Ledger**: process-local record of verifications, logs and risk profile
//!
//! Credibility and pending-verification numbers are placeholders; see
//! [`scoring`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ledger;
pub mod prompt;
pub mod risk;
pub mod scoring;
pub mod traits;
pub mod verification;

// Re-exports for convenience
pub use ledger::{EntryId, LedgerStats, LogLevel, SystemLog, UserRole, VerificationRecord};
pub use prompt::PromptBuilder;
pub use risk::{RateAdjustment, RiskCalculator, RiskMetrics, RiskMetricsUpdate};
pub use verification::{Source, VerificationRequest, VerificationResult};
