//! Live credit-bureau client: per-attempt timeout, bounded retries with
//! exponential backoff, cancellation, and the simulated fallback when no
//! credential is configured.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use tokio::sync::watch;
use tracing::{debug, warn};

use super::{simulation, summarize, BureauConfig, BureauError, BureauGateway, DebtReport};
use crate::screening::domain::BureauSummary;

pub struct BureauClient {
    config: BureauConfig,
    http: reqwest::Client,
}

impl BureauClient {
    pub fn new(config: BureauConfig) -> Result<Self, BureauError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|err| BureauError::Unknown(err.to_string()))?;
        Ok(Self { config, http })
    }

    /// True when no credential is configured and queries are simulated.
    pub fn is_simulated(&self) -> bool {
        self.config.token.is_none()
    }

    async fn attempt(&self, url: &str, token: &str) -> Result<BureauSummary, BureauError> {
        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, format!("BEARER {token}"))
            .header(ACCEPT, "application/json")
            .timeout(self.config.attempt_timeout)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(BureauError::Http {
                status: status.as_u16(),
            });
        }

        let report: DebtReport = response.json().await.map_err(classify_transport)?;
        Ok(summarize(&report.deudas))
    }
}

#[async_trait]
impl BureauGateway for BureauClient {
    async fn query(
        &self,
        tax_id: &str,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<BureauSummary, BureauError> {
        let Some(token) = self.config.token.as_deref() else {
            debug!(tax_id, "no bureau credential configured, serving simulated summary");
            return Ok(simulation::simulated_summary(tax_id));
        };

        let url = format!(
            "{}/Deudas/{}",
            self.config.base_url.trim_end_matches('/'),
            tax_id
        );

        // One in-flight request at a time; the select arms make both the
        // attempt and the backoff sleep cancellable.
        let mut last = BureauError::Unknown("no attempt was made".to_string());
        for attempt in 1..=self.config.max_attempts {
            let outcome = tokio::select! {
                _ = cancelled(&mut cancel) => return Err(BureauError::Cancelled),
                outcome = self.attempt(&url, token) => outcome,
            };

            match outcome {
                Ok(summary) => return Ok(summary),
                Err(err) => {
                    warn!(attempt, error = %err, "bureau attempt failed");
                    last = err;
                }
            }

            if attempt < self.config.max_attempts {
                let wait = self.config.backoff_unit * 2u32.pow(attempt);
                tokio::select! {
                    _ = cancelled(&mut cancel) => return Err(BureauError::Cancelled),
                    _ = tokio::time::sleep(wait) => {}
                }
            }
        }

        Err(BureauError::MaxRetriesExceeded {
            attempts: self.config.max_attempts,
            last: Box::new(last),
        })
    }
}

fn classify_transport(err: reqwest::Error) -> BureauError {
    if err.is_timeout() {
        BureauError::Timeout
    } else {
        BureauError::Unknown(err.to_string())
    }
}

/// Resolves once the flag flips to true. A dropped sender means no caller
/// can ever cancel, so the future parks forever instead of resolving.
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
