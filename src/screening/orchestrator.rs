//! Pipeline sequencing with short-circuit semantics.
//!
//! `Start -> Income -> Delinquency -> Bureau -> Bank -> Amount` and then
//! exactly one of approved / rejected / pending. A failed stage rejects
//! immediately, except bureau technical failures which route to pending.
//! Stages never reached stay in the audit trail as the not-evaluated
//! sentinel.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{info, warn};

use super::amount::compute_max_amount;
use super::bureau::BureauGateway;
use super::domain::{
    ApplicantProfile, Decision, EvaluationOutcome, EvaluationRecord, StageKind, StageOutcome,
    StageResult,
};
use super::registry::{BankDirectory, DelinquencyRegistry, HistorySink};
use super::stages::{bank_stage, bureau_stage, delinquency_stage, income_stage, resolve_tax_id};

/// Fixed rejection message when the computed maximum amount is zero.
pub const DOES_NOT_QUALIFY_MESSAGE: &str =
    "applicant does not qualify for the minimum loan amount";

/// Policy dials for one service instance.
///
/// `stage_delay` models collaborator latency between the synchronous
/// stages; tests set it to zero. `cap_disqualified` selects the alternative
/// tier-5 policy (cap at 100,000 instead of rejecting outright).
#[derive(Debug, Clone)]
pub struct ScreeningConfig {
    pub stage_delay: Duration,
    pub account_block_probability: f64,
    pub cap_disqualified: bool,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            stage_delay: Duration::from_millis(400),
            account_block_probability: 0.05,
            cap_disqualified: false,
        }
    }
}

/// Service composing the rule stages, the bureau gateway, and the audit
/// history sink. Reference tables are shared read-only; concurrent
/// evaluations are fully independent.
pub struct ScreeningService<B, R, H> {
    bureau: Arc<B>,
    registry: Arc<R>,
    history: Arc<H>,
    banks: Arc<BankDirectory>,
    config: ScreeningConfig,
}

impl<B, R, H> ScreeningService<B, R, H>
where
    B: BureauGateway + 'static,
    R: DelinquencyRegistry + 'static,
    H: HistorySink + 'static,
{
    pub fn new(
        bureau: Arc<B>,
        registry: Arc<R>,
        history: Arc<H>,
        banks: Arc<BankDirectory>,
        config: ScreeningConfig,
    ) -> Self {
        Self {
            bureau,
            registry,
            history,
            banks,
            config,
        }
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    /// Run the full pipeline for one applicant. Always returns a complete
    /// outcome; no stage error escapes to the caller. The outcome is handed
    /// to the history sink before returning, and a sink failure is logged
    /// rather than surfaced.
    pub async fn evaluate(
        &self,
        profile: &ApplicantProfile,
        operator: &str,
        cancel: watch::Receiver<bool>,
    ) -> EvaluationOutcome {
        let outcome = self.run_pipeline(profile, cancel).await;

        info!(
            applicant = %profile.full_name,
            operator,
            decision = outcome.decision.label(),
            "evaluation completed"
        );

        let record = EvaluationRecord {
            operator: operator.to_string(),
            applicant: profile.full_name.clone(),
            recorded_at: Utc::now(),
            outcome: outcome.clone(),
        };
        if let Err(err) = self.history.record(record) {
            warn!(error = %err, "failed to record evaluation history");
        }

        outcome
    }

    async fn run_pipeline(
        &self,
        profile: &ApplicantProfile,
        cancel: watch::Receiver<bool>,
    ) -> EvaluationOutcome {
        let mut stages: Vec<StageOutcome> = StageKind::ALL
            .iter()
            .map(|stage| StageOutcome {
                stage: *stage,
                result: StageResult::not_evaluated(),
            })
            .collect();

        self.pace().await;
        let income = income_stage(profile);
        let income_failed = !income.passed;
        let income_message = income.message.clone();
        stages[0].result = income;
        if income_failed {
            return rejected(income_message, stages);
        }

        self.pace().await;
        let delinquency = delinquency_stage(profile, self.registry.as_ref());
        let delinquency_failed = !delinquency.passed;
        let delinquency_message = delinquency.message.clone();
        stages[1].result = delinquency;
        if delinquency_failed {
            return rejected(delinquency_message, stages);
        }

        let (bureau_result, summary) = match resolve_tax_id(&profile.national_id) {
            Ok(tax_id) => {
                let queried = self.bureau.query(&tax_id, cancel).await;
                bureau_stage(queried, self.config.cap_disqualified)
            }
            Err(stage) => (stage, None),
        };
        let bureau_failed = !bureau_result.passed;
        let needs_review = bureau_result.requires_manual_review;
        let bureau_message = bureau_result.message.clone();
        stages[2].result = bureau_result;
        if bureau_failed {
            if needs_review {
                return pending(bureau_message, stages);
            }
            return rejected(bureau_message, stages);
        }

        self.pace().await;
        let bank = bank_stage(profile, &self.banks, self.config.account_block_probability);
        let bank_failed = !bank.passed;
        let bank_message = bank.message.clone();
        stages[3].result = bank;
        if bank_failed {
            return rejected(bank_message, stages);
        }

        // The bank stage passing guarantees the lookup succeeds; the guard
        // keeps the pipeline total regardless.
        let breakdown = match self.banks.lookup(&profile.bank_id) {
            Some(bank_profile) => compute_max_amount(profile, summary.as_ref(), bank_profile),
            None => return rejected("unknown payer bank", stages),
        };

        if breakdown.granted == 0 {
            let mut outcome = rejected(DOES_NOT_QUALIFY_MESSAGE, stages);
            outcome.amount_trail = breakdown.caps;
            return outcome;
        }

        EvaluationOutcome {
            decision: Decision::Approved,
            max_amount: Some(breakdown.granted),
            reason: None,
            stages,
            amount_trail: breakdown.caps,
        }
    }

    async fn pace(&self) {
        if !self.config.stage_delay.is_zero() {
            tokio::time::sleep(self.config.stage_delay).await;
        }
    }
}

fn rejected(reason: impl Into<String>, stages: Vec<StageOutcome>) -> EvaluationOutcome {
    EvaluationOutcome {
        decision: Decision::Rejected,
        max_amount: None,
        reason: Some(reason.into()),
        stages,
        amount_trail: Vec::new(),
    }
}

fn pending(reason: impl Into<String>, stages: Vec<StageOutcome>) -> EvaluationOutcome {
    EvaluationOutcome {
        decision: Decision::Pending,
        max_amount: None,
        reason: Some(reason.into()),
        stages,
        amount_trail: Vec::new(),
    }
}
