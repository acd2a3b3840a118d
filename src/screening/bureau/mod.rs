//! Credit-bureau registry access.
//!
//! One trait seam (`BureauGateway`), one production client
//! (`BureauClient`) covering live HTTP and the deterministic simulated
//! fallback, and the shared reduction from raw debt records to a
//! [`BureauSummary`].

mod client;
mod simulation;

pub use client::BureauClient;
pub use simulation::simulated_summary;

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::watch;

use super::domain::BureauSummary;

/// Classified failure from the bureau client. Everything here is a
/// technical failure, never a credit judgement; the bureau stage maps the
/// whole enum to manual review.
#[derive(Debug, Error)]
pub enum BureauError {
    #[error("bureau request timed out")]
    Timeout,
    #[error("bureau returned HTTP {status}")]
    Http { status: u16 },
    #[error("bureau query cancelled by caller")]
    Cancelled,
    #[error("bureau request failed: {0}")]
    Unknown(String),
    #[error("bureau unavailable after {attempts} attempts: {last}")]
    MaxRetriesExceeded { attempts: u32, last: Box<BureauError> },
}

impl BureauError {
    /// Stable tag used in audit-trail details.
    pub fn classification(&self) -> &'static str {
        match self {
            BureauError::Timeout => "timeout",
            BureauError::Http { .. } => "http_error",
            BureauError::Cancelled => "cancelled",
            BureauError::Unknown(_) => "unknown",
            BureauError::MaxRetriesExceeded { .. } => "max_retries_exceeded",
        }
    }
}

/// Client tuning. `token == None` selects the simulated registry; the
/// backoff between live attempts is `backoff_unit * 2^attempt` (2s then 4s
/// with the one-second default).
#[derive(Debug, Clone)]
pub struct BureauConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub attempt_timeout: Duration,
    pub max_attempts: u32,
    pub backoff_unit: Duration,
}

impl Default for BureauConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.bureau.example/v1".to_string(),
            token: None,
            attempt_timeout: Duration::from_secs(12),
            max_attempts: 3,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

/// Async seam between the orchestrator and the registry, so tests and
/// alternate transports can stand in for the HTTP client.
#[async_trait]
pub trait BureauGateway: Send + Sync {
    /// Query the registry for one tax identifier. Returns a complete
    /// summary or a classified error, never a partial summary. The watch
    /// receiver aborts an in-flight attempt and skips remaining retries.
    async fn query(
        &self,
        tax_id: &str,
        cancel: watch::Receiver<bool>,
    ) -> Result<BureauSummary, BureauError>;
}

/// Receiver that never fires, for callers without a cancellation source.
pub fn never_cancelled() -> watch::Receiver<bool> {
    let (_tx, rx) = watch::channel(false);
    rx
}

/// Wire shape of `GET {base}/Deudas/{taxId}`.
#[derive(Debug, Deserialize)]
pub(crate) struct DebtReport {
    #[serde(default)]
    pub deudas: Vec<DebtEntry>,
    #[serde(default)]
    #[allow(dead_code)]
    pub observaciones: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DebtEntry {
    #[serde(rename = "entidad")]
    pub entity: String,
    #[serde(rename = "situacion")]
    pub tier: i64,
    #[serde(rename = "monto")]
    pub amount: f64,
    #[serde(rename = "fechaActualizacion", default)]
    #[allow(dead_code)]
    pub updated_on: Option<String>,
}

/// Reduce raw debt records to the per-query summary. Records with a tier
/// outside 1..=5 are skipped entirely: not counted and not summed.
pub(crate) fn summarize(entries: &[DebtEntry]) -> BureauSummary {
    let mut tier_counts = [0u32; 5];
    let mut total_amount = 0.0;

    for entry in entries {
        let Ok(tier) = usize::try_from(entry.tier) else {
            continue;
        };
        if !(1..=5).contains(&tier) {
            continue;
        }
        tier_counts[tier - 1] += 1;
        total_amount += entry.amount;
    }

    let total_entities = tier_counts.iter().sum();

    BureauSummary {
        tier_counts,
        total_entities,
        total_amount,
        disqualified: tier_counts[4] > 0,
    }
}
