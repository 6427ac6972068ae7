//! Trait definitions for external interactions
//!
//! Infrastructure implementations live in other crates.

use crate::ledger::{LedgerStats, LogLevel, SystemLog, VerificationRecord};
use crate::risk::{RiskMetrics, RiskMetricsUpdate};
use crate::verification::VerificationResult;

/// Trait for the process-local ledger of verifications, logs and risk profile
///
/// Implemented by the infrastructure layer (tac-store)
pub trait LedgerStore {
    /// Error type for store operations
    type Error;

    /// Record a successful verification
    ///
    /// Applies the verification boost to the risk profile and appends a
    /// success log entry.
    fn record_verification(
        &self,
        query: &str,
        result: VerificationResult,
    ) -> Result<VerificationRecord, Self::Error>;

    /// All recorded verifications, newest first
    fn verifications(&self) -> Result<Vec<VerificationRecord>, Self::Error>;

    /// Append a log entry
    fn log(&self, level: LogLevel, message: &str, source: &str) -> Result<SystemLog, Self::Error>;

    /// All log entries, newest first
    fn logs(&self) -> Result<Vec<SystemLog>, Self::Error>;

    /// Current risk profile
    fn risk_profile(&self) -> Result<RiskMetrics, Self::Error>;

    /// Merge a partial update into the risk profile
    fn update_risk_profile(&self, update: &RiskMetricsUpdate) -> Result<RiskMetrics, Self::Error>;

    /// Derived dashboard statistics
    fn stats(&self) -> Result<LedgerStats, Self::Error>;
}
