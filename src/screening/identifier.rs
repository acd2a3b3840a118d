//! Tax-identifier derivation and check-digit validation.
//!
//! The bureau indexes debtors by an 11-digit tax identifier. Applicants
//! usually supply a 7-8 digit person identifier instead, which is padded,
//! prefixed, and completed with a mod-11 weighted check digit.

use thiserror::Error;

const CHECK_WEIGHTS: [u32; 10] = [5, 4, 3, 2, 7, 6, 5, 4, 3, 2];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("person identifier must be 7 or 8 digits, found {0}")]
    InvalidLength(usize),
    #[error("identifier contains non-numeric characters")]
    NonNumeric,
}

fn digits_of(value: &str) -> Option<Vec<u32>> {
    value.chars().map(|c| c.to_digit(10)).collect()
}

/// Mod-11 weighted check digit over the first ten digits. Remainders 0 and 1
/// both map to digit 0, which keeps derivation total over every person
/// identifier; validation rejects any string whose trailing digit disagrees.
fn check_digit(first_ten: &[u32]) -> u32 {
    let sum: u32 = first_ten
        .iter()
        .zip(CHECK_WEIGHTS)
        .map(|(digit, weight)| digit * weight)
        .sum();
    match sum % 11 {
        0 | 1 => 0,
        rem => 11 - rem,
    }
}

/// True iff `value` is exactly 11 digits and its check digit matches.
pub fn is_valid_tax_id(value: &str) -> bool {
    let Some(digits) = digits_of(value) else {
        return false;
    };
    if digits.len() != 11 {
        return false;
    }
    check_digit(&digits[..10]) == digits[10]
}

/// Derive the bureau's 11-digit tax identifier from a 7-8 digit person
/// identifier: left-pad to 8 digits, prefix "20", append the check digit.
/// Deterministic for every valid input.
pub fn person_id_to_tax_id(person_id: &str) -> Result<String, IdentifierError> {
    let trimmed = person_id.trim();
    if !trimmed.chars().all(|c| c.is_ascii_digit()) || trimmed.is_empty() {
        return Err(IdentifierError::NonNumeric);
    }
    if !(7..=8).contains(&trimmed.len()) {
        return Err(IdentifierError::InvalidLength(trimmed.len()));
    }

    let body = format!("20{trimmed:0>8}");
    let digits: Vec<u32> = body.chars().filter_map(|c| c.to_digit(10)).collect();
    let digit = check_digit(&digits);
    Ok(format!("{body}{digit}"))
}
