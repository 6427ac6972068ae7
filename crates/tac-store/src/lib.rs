//! TaC Engine Store
//!
//! Process-local implementation of the `LedgerStore` trait from `tac-domain`.
//!
//! # Examples
//!
//! ```
//! use tac_domain::traits::LedgerStore;
//! use tac_domain::VerificationResult;
//! use tac_store::InMemoryLedger;
//!
//! let ledger = InMemoryLedger::new();
//! ledger
//!     .record_verification("Solar array commissioned", VerificationResult::text_only("ok"))
//!     .unwrap();
//! assert_eq!(ledger.verifications().unwrap().len(), 1);
//! ```

#![warn(missing_docs)]

pub mod ledger;

use thiserror::Error;

pub use ledger::{stats_with_rng, InMemoryLedger, DEFAULT_MAX_ENTRIES};

/// Errors that can occur during ledger operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// A writer panicked while holding the ledger lock
    #[error("Ledger lock poisoned")]
    LockPoisoned,

    /// Rejected risk profile update
    #[error("Invalid risk metrics: {0}")]
    InvalidMetrics(String),
}
