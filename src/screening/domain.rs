use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Employment category declared by the applicant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentCategory {
    PublicSector,
    PrivateSector,
    Retiree,
    Unset,
}

impl EmploymentCategory {
    pub const fn label(self) -> &'static str {
        match self {
            EmploymentCategory::PublicSector => "public_sector",
            EmploymentCategory::PrivateSector => "private_sector",
            EmploymentCategory::Retiree => "retiree",
            EmploymentCategory::Unset => "unset",
        }
    }
}

/// Immutable applicant snapshot submitted for screening.
///
/// `national_id` carries either a 7-8 digit person identifier or a full
/// 11-digit tax identifier; the bureau stage derives or validates the tax
/// form before querying. Province allow-listing happens at the intake
/// boundary, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantProfile {
    pub full_name: String,
    pub national_id: String,
    pub net_monthly_income: u64,
    pub employment: EmploymentCategory,
    #[serde(default)]
    pub province: String,
    pub bank_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_account: Option<String>,
}

/// Static reference row for a supported payer bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankProfile {
    pub id: String,
    pub name: String,
    pub has_restrictions: bool,
    /// 1 is best, 5 worst.
    pub risk_tier: u8,
    pub requires_account: bool,
}

/// Aggregated answer for one credit-bureau query.
///
/// Constructed once by the reduction step and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BureauSummary {
    /// Reporting-entity counts indexed by risk tier 1..=5.
    pub tier_counts: [u32; 5],
    pub total_entities: u32,
    pub total_amount: f64,
    /// True iff at least one reporting entity sits in tier 5.
    pub disqualified: bool,
}

impl BureauSummary {
    /// Share of reporting entities in tiers 3-5, as a percentage.
    /// Zero when nothing reported.
    pub fn problematic_pct(&self) -> f64 {
        if self.total_entities == 0 {
            return 0.0;
        }
        let problematic = self.tier_counts[2] + self.tier_counts[3] + self.tier_counts[4];
        100.0 * f64::from(problematic) / f64::from(self.total_entities)
    }
}

/// Pipeline stages in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Income,
    Delinquency,
    Bureau,
    Bank,
}

impl StageKind {
    pub const ALL: [StageKind; 4] = [
        StageKind::Income,
        StageKind::Delinquency,
        StageKind::Bureau,
        StageKind::Bank,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            StageKind::Income => "income",
            StageKind::Delinquency => "delinquency",
            StageKind::Bureau => "bureau",
            StageKind::Bank => "bank",
        }
    }
}

pub(crate) const NOT_EVALUATED_MESSAGE: &str = "not evaluated";

/// Uniform verdict emitted by every stage.
///
/// `detail` is always present, possibly empty, so the audit trail stays
/// complete even when the pipeline short-circuits early.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    pub passed: bool,
    pub message: String,
    pub detail: BTreeMap<String, Value>,
    pub requires_manual_review: bool,
}

impl StageResult {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            detail: BTreeMap::new(),
            requires_manual_review: false,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            detail: BTreeMap::new(),
            requires_manual_review: false,
        }
    }

    /// Technical failure that should route to manual review instead of an
    /// outright rejection.
    pub fn manual_review(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            detail: BTreeMap::new(),
            requires_manual_review: true,
        }
    }

    /// Canonical sentinel for stages the pipeline never reached.
    pub fn not_evaluated() -> Self {
        Self::fail(NOT_EVALUATED_MESSAGE)
    }

    pub fn is_not_evaluated(&self) -> bool {
        self.message == NOT_EVALUATED_MESSAGE && self.detail.is_empty()
    }

    pub fn with_detail(mut self, key: &str, value: Value) -> Self {
        self.detail.insert(key.to_string(), value);
        self
    }
}

/// Stage verdict paired with its position in the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageOutcome {
    pub stage: StageKind,
    pub result: StageResult,
}

/// Tri-state decision for a completed evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approved,
    Rejected,
    Pending,
}

impl Decision {
    pub const fn label(self) -> &'static str {
        match self {
            Decision::Approved => "approved",
            Decision::Rejected => "rejected",
            Decision::Pending => "pending",
        }
    }
}

/// One applied (or considered) cap from the amount calculator, kept so the
/// final figure can be explained rule by rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedCap {
    pub rule: String,
    pub cap: u64,
    pub applied: bool,
}

/// Final artifact of one evaluation. Immutable once returned; the four
/// `stages` entries are always present in pipeline order, with unreached
/// stages carrying the not-evaluated sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationOutcome {
    pub decision: Decision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub stages: Vec<StageOutcome>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub amount_trail: Vec<AppliedCap>,
}

impl EvaluationOutcome {
    pub fn stage(&self, kind: StageKind) -> Option<&StageResult> {
        self.stages
            .iter()
            .find(|entry| entry.stage == kind)
            .map(|entry| &entry.result)
    }
}

/// History entry handed to the audit collaborator after each evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub operator: String,
    pub applicant: String,
    pub recorded_at: DateTime<Utc>,
    pub outcome: EvaluationOutcome,
}
