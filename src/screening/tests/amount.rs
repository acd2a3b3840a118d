use super::common::{profile, summary};
use crate::screening::amount::compute_max_amount;
use crate::screening::domain::EmploymentCategory;
use crate::screening::registry::BankDirectory;

fn bank(id: &str) -> crate::screening::domain::BankProfile {
    BankDirectory::standard()
        .lookup(id)
        .expect("bank in standard table")
        .clone()
}

#[test]
fn mid_bracket_public_sector_with_clean_bureau() {
    let applicant = profile(900_000, EmploymentCategory::PublicSector, "bna");
    let clean = summary([2, 0, 0, 0, 0], 30_000.0);

    let breakdown = compute_max_amount(&applicant, Some(&clean), &bank("bna"));

    assert_eq!(breakdown.base, 150_000);
    assert_eq!(breakdown.granted, 150_000);
    assert!(breakdown.caps.iter().all(|cap| !cap.applied));
}

#[test]
fn top_bracket_reaches_the_employment_ceiling() {
    let applicant = profile(1_200_000, EmploymentCategory::Retiree, "bna");
    let clean = summary([2, 0, 0, 0, 0], 30_000.0);

    let breakdown = compute_max_amount(&applicant, Some(&clean), &bank("bna"));
    assert_eq!(breakdown.granted, 200_000);
}

#[test]
fn private_sector_is_capped_below_the_top_bracket() {
    let applicant = profile(1_200_000, EmploymentCategory::PrivateSector, "bna");
    let clean = summary([2, 0, 0, 0, 0], 30_000.0);

    let breakdown = compute_max_amount(&applicant, Some(&clean), &bank("bna"));
    assert_eq!(breakdown.granted, 150_000);

    let applied: Vec<&str> = breakdown
        .caps
        .iter()
        .filter(|cap| cap.applied)
        .map(|cap| cap.rule.as_str())
        .collect();
    assert_eq!(applied, vec!["employment_category"]);
}

#[test]
fn undeclared_employment_uses_the_private_ceiling() {
    let applicant = profile(1_200_000, EmploymentCategory::Unset, "bna");
    let breakdown = compute_max_amount(&applicant, None, &bank("bna"));
    assert_eq!(breakdown.granted, 150_000);
}

#[test]
fn tier_three_bank_caps_the_amount() {
    let applicant = profile(1_200_000, EmploymentCategory::PublicSector, "bint");
    let clean = summary([2, 0, 0, 0, 0], 30_000.0);

    let breakdown = compute_max_amount(&applicant, Some(&clean), &bank("bint"));
    assert_eq!(breakdown.granted, 150_000);
    assert!(breakdown
        .caps
        .iter()
        .any(|cap| cap.rule == "bank_risk_tier" && cap.applied));
}

#[test]
fn bureau_caps_apply_independently() {
    let applicant = profile(1_200_000, EmploymentCategory::PublicSector, "bna");

    // 1 of 4 entities problematic: 25% > 20% threshold.
    let share_only = summary([3, 0, 1, 0, 0], 30_000.0);
    let breakdown = compute_max_amount(&applicant, Some(&share_only), &bank("bna"));
    assert_eq!(breakdown.granted, 100_000);

    let outstanding_only = summary([2, 0, 0, 0, 0], 150_000.0);
    let breakdown = compute_max_amount(&applicant, Some(&outstanding_only), &bank("bna"));
    assert_eq!(breakdown.granted, 100_000);

    let both = summary([3, 0, 1, 0, 0], 150_000.0);
    let breakdown = compute_max_amount(&applicant, Some(&both), &bank("bna"));
    assert_eq!(breakdown.granted, 100_000);
    let applied: Vec<&str> = breakdown
        .caps
        .iter()
        .filter(|cap| cap.applied)
        .map(|cap| cap.rule.as_str())
        .collect();
    assert!(applied.contains(&"bureau_problematic_share"));
}

#[test]
fn below_bracket_income_grants_nothing() {
    let applicant = profile(400_000, EmploymentCategory::PublicSector, "bna");
    let breakdown = compute_max_amount(&applicant, None, &bank("bna"));
    assert_eq!(breakdown.base, 0);
    assert_eq!(breakdown.granted, 0);
}

#[test]
fn granted_amount_never_exceeds_base_or_any_applied_cap() {
    let banks = BankDirectory::standard();
    let summaries = [
        summary([2, 0, 0, 0, 0], 30_000.0),
        summary([3, 0, 1, 0, 0], 30_000.0),
        summary([1, 0, 1, 1, 0], 250_000.0),
    ];

    for bank_profile in banks.iter() {
        for bureau in &summaries {
            for income in [450_000, 700_000, 900_000, 1_500_000] {
                for employment in [
                    EmploymentCategory::PublicSector,
                    EmploymentCategory::PrivateSector,
                    EmploymentCategory::Retiree,
                    EmploymentCategory::Unset,
                ] {
                    let applicant = profile(income, employment, &bank_profile.id);
                    let breakdown =
                        compute_max_amount(&applicant, Some(bureau), bank_profile);

                    assert!(breakdown.granted <= breakdown.base);
                    for cap in breakdown.caps.iter().filter(|cap| cap.applied) {
                        assert!(breakdown.granted <= cap.cap, "rule {}", cap.rule);
                    }
                }
            }
        }
    }
}
