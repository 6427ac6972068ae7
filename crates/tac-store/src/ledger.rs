//! In-memory ledger of verifications, logs and the rolling risk profile.
//!
//! State lives for the lifetime of the process and is lost on restart.
//! Verifications and logs are each capped at `max_entries`; the oldest
//! entries are evicted first.

use crate::StoreError;
use rand::Rng;
use std::collections::VecDeque;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tac_domain::scoring::simulated_pending_verifications;
use tac_domain::traits::LedgerStore;
use tac_domain::{
    LedgerStats, LogLevel, RiskMetrics, RiskMetricsUpdate, SystemLog, VerificationRecord,
    VerificationResult,
};
use tracing::debug;

/// Default cap on retained verifications and on retained logs
pub const DEFAULT_MAX_ENTRIES: usize = 500;

#[derive(Debug)]
struct LedgerState {
    // Append order; readers reverse to get newest first
    verifications: VecDeque<VerificationRecord>,
    logs: VecDeque<SystemLog>,
    risk_profile: RiskMetrics,
}

fn push_bounded<T>(entries: &mut VecDeque<T>, entry: T, max_entries: usize) {
    entries.push_back(entry);
    while entries.len() > max_entries {
        entries.pop_front();
    }
}

/// Process-local ledger backed by an `RwLock`
///
/// Clones share the same underlying state.
#[derive(Debug, Clone)]
pub struct InMemoryLedger {
    state: Arc<RwLock<LedgerState>>,
    max_entries: usize,
}

impl InMemoryLedger {
    /// Create a ledger with the default risk profile and the initial log entry
    pub fn new() -> Self {
        Self::with_risk_profile(RiskMetrics::default())
    }

    /// Create a ledger starting from the given risk profile
    pub fn with_risk_profile(risk_profile: RiskMetrics) -> Self {
        Self {
            state: Arc::new(RwLock::new(LedgerState {
                verifications: VecDeque::new(),
                logs: VecDeque::from([SystemLog::initialized()]),
                risk_profile,
            })),
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }

    /// Set how many verifications and logs are retained (at least one)
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    /// Retention cap for verifications and for logs
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Number of recorded verifications
    pub fn verification_count(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.verifications.len())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, LedgerState>, StoreError> {
        self.state.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, LedgerState>, StoreError> {
        self.state.write().map_err(|_| StoreError::LockPoisoned)
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerStore for InMemoryLedger {
    type Error = StoreError;

    fn record_verification(
        &self,
        query: &str,
        result: VerificationResult,
    ) -> Result<VerificationRecord, Self::Error> {
        let record = VerificationRecord::new(query, result);
        let max_entries = self.max_entries;
        let mut state = self.write()?;

        push_bounded(&mut state.verifications, record.clone(), max_entries);
        state.risk_profile = state.risk_profile.boosted();
        push_bounded(
            &mut state.logs,
            SystemLog::verification_completed(query),
            max_entries,
        );

        debug!(
            "Recorded verification {} (score now {})",
            record.id, state.risk_profile.sustainability_score
        );
        Ok(record)
    }

    fn verifications(&self) -> Result<Vec<VerificationRecord>, Self::Error> {
        Ok(self.read()?.verifications.iter().rev().cloned().collect())
    }

    fn log(&self, level: LogLevel, message: &str, source: &str) -> Result<SystemLog, Self::Error> {
        let entry = SystemLog::new(level, message, source);
        let mut state = self.write()?;
        push_bounded(&mut state.logs, entry.clone(), self.max_entries);
        Ok(entry)
    }

    fn logs(&self) -> Result<Vec<SystemLog>, Self::Error> {
        Ok(self.read()?.logs.iter().rev().cloned().collect())
    }

    fn risk_profile(&self) -> Result<RiskMetrics, Self::Error> {
        Ok(self.read()?.risk_profile)
    }

    fn update_risk_profile(&self, update: &RiskMetricsUpdate) -> Result<RiskMetrics, Self::Error> {
        let mut state = self.write()?;
        let merged = state.risk_profile.merged(update);
        merged.validate().map_err(StoreError::InvalidMetrics)?;
        state.risk_profile = merged;
        Ok(merged)
    }

    fn stats(&self) -> Result<LedgerStats, Self::Error> {
        stats_with_rng(self, &mut rand::thread_rng())
    }
}

/// Compute ledger stats drawing the pending count from `rng`
pub fn stats_with_rng<R: Rng + ?Sized>(
    ledger: &InMemoryLedger,
    rng: &mut R,
) -> Result<LedgerStats, StoreError> {
    Ok(LedgerStats {
        total_value_locked: ledger.risk_profile()?.collateral_value,
        pending_verifications: simulated_pending_verifications(rng),
    })
}
