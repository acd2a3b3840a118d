//! Injected collaborator seams: the delinquency registry, the payer-bank
//! reference table, and the evaluation history sink. The orchestrator only
//! ever sees these interfaces, so tests can substitute doubles and no
//! module-global mutable state exists.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use super::domain::{BankProfile, EvaluationRecord};

/// Known-delinquent lookup, keyed by national identifier. The real
/// implementation lives outside this crate.
pub trait DelinquencyRegistry: Send + Sync {
    fn find_by_national_id(&self, national_id: &str) -> Option<DelinquencyRecord>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelinquencyRecord {
    pub has_active_debt: bool,
    pub amount: f64,
}

/// In-memory registry used by the demo wiring and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryDelinquencyRegistry {
    entries: HashMap<String, DelinquencyRecord>,
}

impl MemoryDelinquencyRegistry {
    pub fn new(entries: impl IntoIterator<Item = (String, DelinquencyRecord)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }
}

impl DelinquencyRegistry for MemoryDelinquencyRegistry {
    fn find_by_national_id(&self, national_id: &str) -> Option<DelinquencyRecord> {
        self.entries.get(national_id.trim()).cloned()
    }
}

/// Read-only reference table of supported payer banks. Exactly one row per
/// identifier; the set is small enough that a linear scan is fine.
#[derive(Debug, Clone)]
pub struct BankDirectory {
    banks: Vec<BankProfile>,
}

impl BankDirectory {
    /// Builds the directory, keeping the first row for any duplicated id.
    pub fn new(banks: Vec<BankProfile>) -> Self {
        let mut unique: Vec<BankProfile> = Vec::with_capacity(banks.len());
        for bank in banks {
            if !unique.iter().any(|existing| existing.id == bank.id) {
                unique.push(bank);
            }
        }
        Self { banks: unique }
    }

    pub fn lookup(&self, id: &str) -> Option<&BankProfile> {
        self.banks.iter().find(|bank| bank.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BankProfile> {
        self.banks.iter()
    }

    /// Seed table used by the binary and fixtures.
    pub fn standard() -> Self {
        Self::new(vec![
            BankProfile {
                id: "bna".to_string(),
                name: "Banco de la Nación".to_string(),
                has_restrictions: false,
                risk_tier: 1,
                requires_account: false,
            },
            BankProfile {
                id: "bpro".to_string(),
                name: "Banco Provincia".to_string(),
                has_restrictions: false,
                risk_tier: 2,
                requires_account: false,
            },
            BankProfile {
                id: "bciu".to_string(),
                name: "Banco Ciudad".to_string(),
                has_restrictions: false,
                risk_tier: 2,
                requires_account: true,
            },
            BankProfile {
                id: "bsur".to_string(),
                name: "Banco del Sur".to_string(),
                has_restrictions: true,
                risk_tier: 3,
                requires_account: true,
            },
            BankProfile {
                id: "bint".to_string(),
                name: "Banco Interfin".to_string(),
                has_restrictions: false,
                risk_tier: 3,
                requires_account: false,
            },
            BankProfile {
                id: "bpat".to_string(),
                name: "Banco Patagonia Austral".to_string(),
                has_restrictions: false,
                risk_tier: 4,
                requires_account: false,
            },
        ])
    }
}

/// Receives completed evaluations for audit and operator review.
pub trait HistorySink: Send + Sync {
    fn record(&self, record: EvaluationRecord) -> Result<(), HistoryError>;
    /// Most recent evaluations first.
    fn recent(&self, limit: usize) -> Result<Vec<EvaluationRecord>, HistoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("history store unavailable: {0}")]
    Unavailable(String),
}

/// Process-local history store.
#[derive(Default, Clone)]
pub struct MemoryHistory {
    records: Arc<Mutex<Vec<EvaluationRecord>>>,
}

impl HistorySink for MemoryHistory {
    fn record(&self, record: EvaluationRecord) -> Result<(), HistoryError> {
        self.records
            .lock()
            .map_err(|_| HistoryError::Unavailable("history mutex poisoned".to_string()))?
            .push(record);
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<EvaluationRecord>, HistoryError> {
        let guard = self
            .records
            .lock()
            .map_err(|_| HistoryError::Unavailable("history mutex poisoned".to_string()))?;
        Ok(guard.iter().rev().take(limit).cloned().collect())
    }
}
