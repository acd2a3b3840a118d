//! Loan pre-approval screening service.
//!
//! The crate evaluates short-term loan applications through a sequential,
//! short-circuiting pipeline: income check, delinquency-registry lookup,
//! credit-bureau query, payer-bank eligibility, and maximum-amount
//! derivation. The bureau client is the only stage that talks to the
//! network; everything else is pure computation against injected,
//! read-only reference tables.

pub mod config;
pub mod error;
pub mod screening;
pub mod telemetry;
