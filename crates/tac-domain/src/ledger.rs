//! Ledger entries: verification records, system logs and dashboard stats

use crate::verification::{Source, VerificationResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Confidence attached to every recorded verification
///
/// Fixed mock value; no confidence is derived from the model output.
pub const MOCK_CONFIDENCE_SCORE: f64 = 0.85;

/// Identifier for ledger entries, based on UUIDv7
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(uuid::Uuid);

impl EntryId {
    /// Generate a new time-ordered identifier
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A completed verification kept for the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRecord {
    /// Record identifier
    pub id: EntryId,
    /// When the record was created
    pub timestamp: DateTime<Utc>,
    /// The claim as submitted
    pub query: String,
    /// Model justification text
    pub text: String,
    /// Cited sources
    pub sources: Vec<Source>,
    /// Mock confidence score
    pub confidence_score: f64,
}

impl VerificationRecord {
    /// Create a record for a query and its result
    pub fn new(query: impl Into<String>, result: VerificationResult) -> Self {
        Self {
            id: EntryId::new(),
            timestamp: Utc::now(),
            query: query.into(),
            text: result.text,
            sources: result.sources,
            confidence_score: MOCK_CONFIDENCE_SCORE,
        }
    }
}

/// Severity of a system log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Informational
    Info,
    /// Warning
    Warn,
    /// Successful operation
    Success,
    /// Failure
    Error,
}

/// An entry of the system activity log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemLog {
    /// Entry identifier
    pub id: EntryId,
    /// When the entry was created
    pub timestamp: DateTime<Utc>,
    /// Severity
    pub level: LogLevel,
    /// Message text
    pub message: String,
    /// Emitting component (e.g. "Verification Agent")
    pub source: String,
}

impl SystemLog {
    /// Create a log entry stamped now
    pub fn new(level: LogLevel, message: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: EntryId::new(),
            timestamp: Utc::now(),
            level,
            message: message.into(),
            source: source.into(),
        }
    }

    /// The entry every fresh ledger starts with
    pub fn initialized() -> Self {
        Self::new(LogLevel::Info, "System initialized.", "System")
    }

    /// Success entry for a completed verification
    pub fn verification_completed(query: &str) -> Self {
        let preview: String = query.chars().take(30).collect();
        Self::new(
            LogLevel::Success,
            format!("Verification completed for query: \"{}...\"", preview),
            "Verification Agent",
        )
    }
}

/// Derived dashboard statistics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerStats {
    /// Collateral value of the current risk profile
    pub total_value_locked: f64,
    /// Simulated pending verification count
    pub pending_verifications: u32,
}

/// Role a demo user plays; only used to label views
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    /// Project owner seeking a discount
    #[default]
    Borrower,
    /// Capital provider
    Lender,
    /// Independent reviewer
    Auditor,
}

impl UserRole {
    /// Greeting shown at the top of the dashboard
    pub fn welcome_message(&self) -> &'static str {
        match self {
            UserRole::Borrower => {
                "Your sustainability data is currently optimizing your credit profile."
            }
            UserRole::Lender => "Portfolio risk analysis based on real-time verification layers.",
            UserRole::Auditor => "Monitoring system integrity and verification audit trails.",
        }
    }

    /// Title of the collateral/capacity card
    pub fn capacity_title(&self) -> &'static str {
        match self {
            UserRole::Borrower => "Unlocked Credit Capacity",
            UserRole::Lender => "Total Verified Exposure",
            UserRole::Auditor => "Active Verification Agents",
        }
    }

    /// Title of the rate card
    pub fn rate_title(&self) -> &'static str {
        match self {
            UserRole::Borrower => "Interest Rate Reduction",
            UserRole::Lender => "Portfolio Yield Boost",
            UserRole::Auditor => "Average Confidence Score",
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BORROWER" => Ok(UserRole::Borrower),
            "LENDER" => Ok(UserRole::Lender),
            "AUDITOR" => Ok(UserRole::Auditor),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_uses_mock_confidence() {
        let record = VerificationRecord::new("claim", VerificationResult::text_only("ok"));
        assert_eq!(record.confidence_score, MOCK_CONFIDENCE_SCORE);
        assert_eq!(record.query, "claim");
        assert!(record.sources.is_empty());
    }

    #[test]
    fn test_completed_log_truncates_query() {
        let log = SystemLog::verification_completed(
            "Verify 50 hectares of reforestation in Mato Grosso",
        );
        assert_eq!(log.level, LogLevel::Success);
        assert_eq!(log.source, "Verification Agent");
        assert_eq!(
            log.message,
            "Verification completed for query: \"Verify 50 hectares of reforest...\""
        );
    }

    #[test]
    fn test_completed_log_multibyte_query() {
        let log = SystemLog::verification_completed("Reflorestamento em São Paulo ✓✓✓✓");
        assert!(log.message.starts_with("Verification completed for query: \"Reflorestamento"));
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("lender".parse::<UserRole>().unwrap(), UserRole::Lender);
        assert_eq!("AUDITOR".parse::<UserRole>().unwrap(), UserRole::Auditor);
        assert!("admin".parse::<UserRole>().is_err());
        assert_eq!(UserRole::default(), UserRole::Borrower);
        assert_eq!(UserRole::Lender.rate_title(), "Portfolio Yield Boost");
    }

    #[test]
    fn test_log_level_serialization() {
        let json = serde_json::to_string(&LogLevel::Success).unwrap();
        assert_eq!(json, "\"SUCCESS\"");
    }
}
