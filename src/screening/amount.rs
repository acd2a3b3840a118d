//! Maximum-amount derivation.
//!
//! The base figure comes from the income bracket; an ordered list of named
//! cap rules is then applied left-to-right. Every considered rule lands in
//! the breakdown so an operator can see exactly which cap bound the final
//! amount.

use super::domain::{AppliedCap, ApplicantProfile, BankProfile, BureauSummary, EmploymentCategory};

const BRACKET_TOP: u64 = 1_000_000;
const BRACKET_MID: u64 = 800_000;
const BRACKET_LOW: u64 = 500_000;

const AMOUNT_TOP: u64 = 200_000;
const AMOUNT_MID: u64 = 150_000;
const AMOUNT_LOW: u64 = 100_000;

/// Bureau exposure above this share of problematic entities caps the amount.
const PROBLEMATIC_CAP_PCT: f64 = 20.0;

/// Bureau outstanding total above this caps the amount.
const OUTSTANDING_CAP_TOTAL: f64 = 100_000.0;

/// Full derivation trail for one amount computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountBreakdown {
    pub base: u64,
    pub caps: Vec<AppliedCap>,
    pub granted: u64,
}

fn income_bracket_base(net_monthly_income: u64) -> u64 {
    if net_monthly_income >= BRACKET_TOP {
        AMOUNT_TOP
    } else if net_monthly_income >= BRACKET_MID {
        AMOUNT_MID
    } else if net_monthly_income >= BRACKET_LOW {
        AMOUNT_LOW
    } else {
        0
    }
}

fn apply_cap(caps: &mut Vec<AppliedCap>, granted: &mut u64, rule: &str, cap: u64) {
    let applied = cap < *granted;
    if applied {
        *granted = cap;
    }
    caps.push(AppliedCap {
        rule: rule.to_string(),
        cap,
        applied,
    });
}

/// Derive the maximum approvable amount. A result of zero means the
/// applicant does not qualify even though every stage passed; the
/// orchestrator turns that into a rejection.
pub fn compute_max_amount(
    profile: &ApplicantProfile,
    bureau: Option<&BureauSummary>,
    bank: &BankProfile,
) -> AmountBreakdown {
    let base = income_bracket_base(profile.net_monthly_income);
    let mut granted = base;
    let mut caps = Vec::new();

    let employment_cap = match profile.employment {
        EmploymentCategory::PublicSector | EmploymentCategory::Retiree => AMOUNT_TOP,
        // Undeclared employment gets the private-sector ceiling.
        EmploymentCategory::PrivateSector | EmploymentCategory::Unset => AMOUNT_MID,
    };
    apply_cap(&mut caps, &mut granted, "employment_category", employment_cap);

    if bank.risk_tier == 3 {
        apply_cap(&mut caps, &mut granted, "bank_risk_tier", AMOUNT_MID);
    }

    if let Some(summary) = bureau {
        if summary.problematic_pct() > PROBLEMATIC_CAP_PCT {
            apply_cap(&mut caps, &mut granted, "bureau_problematic_share", AMOUNT_LOW);
        }
        if summary.total_amount > OUTSTANDING_CAP_TOTAL {
            apply_cap(&mut caps, &mut granted, "bureau_outstanding_total", AMOUNT_LOW);
        }
        // Inert under the rejection policy; binds only when disqualified
        // summaries are allowed through to the amount path.
        if summary.disqualified {
            apply_cap(&mut caps, &mut granted, "bureau_disqualified", AMOUNT_LOW);
        }
    }

    AmountBreakdown {
        base,
        caps,
        granted,
    }
}
