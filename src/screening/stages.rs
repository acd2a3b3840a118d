//! Individual rule stages of the screening pipeline.
//!
//! Every stage is a pure function over the applicant profile and its
//! injected reference data, returning a [`StageResult`]. Nothing here
//! mutates shared state; the orchestrator owns sequencing.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use serde_json::json;

use super::bureau::BureauError;
use super::domain::{ApplicantProfile, BureauSummary, EmploymentCategory, StageResult};
use super::identifier::{self, IdentifierError};
use super::registry::{BankDirectory, DelinquencyRegistry};

/// Minimum net monthly income, in currency units.
pub const MIN_NET_INCOME: u64 = 500_000;

/// Income at or below this floor is ineligible through a restricted bank.
pub const RESTRICTED_BANK_INCOME_FLOOR: u64 = 650_000;

/// Banks at this risk tier or worse are not accepted as payer banks.
pub const HIGH_RISK_TIER: u8 = 4;

/// Share of reporting entities in tiers 3-5 at which the bureau stage fails.
pub const PROBLEMATIC_PCT_LIMIT: f64 = 40.0;

pub fn income_stage(profile: &ApplicantProfile) -> StageResult {
    let base = StageResult::pass("income requirement met")
        .with_detail("net_monthly_income", json!(profile.net_monthly_income))
        .with_detail("required_minimum", json!(MIN_NET_INCOME));

    if profile.net_monthly_income < MIN_NET_INCOME {
        StageResult::fail(format!(
            "net monthly income is below the required minimum of {MIN_NET_INCOME}"
        ))
        .with_detail("net_monthly_income", json!(profile.net_monthly_income))
        .with_detail("required_minimum", json!(MIN_NET_INCOME))
    } else {
        base
    }
}

pub fn delinquency_stage<R>(profile: &ApplicantProfile, registry: &R) -> StageResult
where
    R: DelinquencyRegistry + ?Sized,
{
    match registry.find_by_national_id(&profile.national_id) {
        Some(record) if record.has_active_debt => {
            StageResult::fail("listed in the delinquency registry with an active debt")
                .with_detail("outstanding_amount", json!(record.amount))
        }
        Some(_) => StageResult::pass("registry entry found but no active debt"),
        None => StageResult::pass("not listed in the delinquency registry"),
    }
}

/// Resolve the applicant's identifier into the bureau's tax form. An
/// 11-digit input is validated as-is; a 7-8 digit person identifier is
/// converted. Malformed input is a policy rejection, never a pending case.
pub fn resolve_tax_id(national_id: &str) -> Result<String, StageResult> {
    let trimmed = national_id.trim();

    if trimmed.len() == 11 {
        return if identifier::is_valid_tax_id(trimmed) {
            Ok(trimmed.to_string())
        } else {
            Err(
                StageResult::fail("tax identifier failed check-digit validation")
                    .with_detail("national_id", json!(trimmed)),
            )
        };
    }

    identifier::person_id_to_tax_id(trimmed).map_err(|err| {
        let message = match err {
            IdentifierError::InvalidLength(len) => {
                format!("national identifier must be 7 or 8 digits, found {len}")
            }
            IdentifierError::NonNumeric => {
                "national identifier contains non-numeric characters".to_string()
            }
        };
        StageResult::fail(message).with_detail("national_id", json!(trimmed))
    })
}

/// Classify a bureau query outcome. Credit problems reject; transport
/// problems route to manual review. Returns the summary alongside the
/// verdict so the amount calculator can consume it later.
pub fn bureau_stage(
    outcome: Result<BureauSummary, BureauError>,
    cap_disqualified: bool,
) -> (StageResult, Option<BureauSummary>) {
    match outcome {
        Ok(summary) => {
            let pct = summary.problematic_pct();
            let detail = |result: StageResult| {
                result
                    .with_detail("tier_counts", json!(summary.tier_counts))
                    .with_detail("total_entities", json!(summary.total_entities))
                    .with_detail("total_amount", json!(summary.total_amount))
                    .with_detail("problematic_pct", json!(pct))
                    .with_detail("disqualified", json!(summary.disqualified))
            };

            if summary.disqualified && !cap_disqualified {
                let result = detail(StageResult::fail(
                    "registry reports a tier-5 delinquency for this applicant",
                ));
                (result, Some(summary))
            } else if pct >= PROBLEMATIC_PCT_LIMIT {
                let result = detail(StageResult::fail(format!(
                    "{pct:.1}% of reporting entities sit in problem tiers (limit {PROBLEMATIC_PCT_LIMIT}%)"
                )));
                (result, Some(summary))
            } else {
                let result = detail(StageResult::pass("bureau exposure within policy"));
                (result, Some(summary))
            }
        }
        Err(err) => {
            let result = StageResult::manual_review(format!("bureau unavailable: {err}"))
                .with_detail("classification", json!(err.classification()));
            (result, None)
        }
    }
}

pub fn bank_stage(
    profile: &ApplicantProfile,
    banks: &BankDirectory,
    account_block_probability: f64,
) -> StageResult {
    let Some(bank) = banks.lookup(&profile.bank_id) else {
        return StageResult::fail("unknown payer bank")
            .with_detail("bank_id", json!(profile.bank_id));
    };

    let account = profile.bank_account.as_deref().map(str::trim);
    if bank.requires_account && account.map_or(true, str::is_empty) {
        return StageResult::fail(format!(
            "{} requires a bank account number and none was supplied",
            bank.name
        ))
        .with_detail("bank_id", json!(bank.id));
    }

    if bank.has_restrictions && profile.net_monthly_income <= RESTRICTED_BANK_INCOME_FLOOR {
        return StageResult::fail(format!(
            "{} is restricted for incomes at or below {RESTRICTED_BANK_INCOME_FLOOR}",
            bank.name
        ))
        .with_detail("net_monthly_income", json!(profile.net_monthly_income));
    }

    if bank.risk_tier >= HIGH_RISK_TIER {
        return StageResult::fail(format!(
            "{} carries risk tier {} and is not an accepted payer bank",
            bank.name, bank.risk_tier
        ))
        .with_detail("risk_tier", json!(bank.risk_tier));
    }

    if bank.requires_account
        && bank.has_restrictions
        && profile.employment == EmploymentCategory::PrivateSector
    {
        return StageResult::fail(format!(
            "private-sector applicants are not eligible through {}",
            bank.name
        ))
        .with_detail("employment", json!(profile.employment.label()));
    }

    // Stand-in for a real account-status lookup: a deterministic,
    // identifier-seeded draw against the configured block probability.
    let mut rng = Pcg64Mcg::seed_from_u64(account_check_seed(&profile.national_id));
    if rng.gen::<f64>() < account_block_probability {
        return StageResult::fail("payer account is reported as blocked")
            .with_detail("bank_id", json!(bank.id));
    }

    StageResult::pass(format!("{} accepted as payer bank", bank.name))
        .with_detail("bank_id", json!(bank.id))
        .with_detail("risk_tier", json!(bank.risk_tier))
}

fn account_check_seed(national_id: &str) -> u64 {
    // Salted FNV-1a so this stream never collides with the bureau
    // simulation stream for the same applicant.
    national_id
        .bytes()
        .fold(0x6c62_272e_07bb_0142u64, |acc, byte| {
            (acc ^ u64::from(byte)).wrapping_mul(0x0000_0100_0000_01b3)
        })
}
