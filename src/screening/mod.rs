//! Loan pre-approval screening pipeline.

pub mod amount;
pub mod bureau;
pub mod domain;
pub mod identifier;
pub mod orchestrator;
pub mod registry;
pub mod router;
pub mod stages;

#[cfg(test)]
mod tests;

pub use amount::{compute_max_amount, AmountBreakdown};
pub use bureau::{
    never_cancelled, simulated_summary, BureauClient, BureauConfig, BureauError, BureauGateway,
};
pub use domain::{
    ApplicantProfile, AppliedCap, BankProfile, BureauSummary, Decision, EmploymentCategory,
    EvaluationOutcome, EvaluationRecord, StageKind, StageOutcome, StageResult,
};
pub use identifier::{is_valid_tax_id, person_id_to_tax_id, IdentifierError};
pub use orchestrator::{
    ScreeningConfig, ScreeningService, DOES_NOT_QUALIFY_MESSAGE,
};
pub use registry::{
    BankDirectory, DelinquencyRecord, DelinquencyRegistry, HistoryError, HistorySink,
    MemoryDelinquencyRegistry, MemoryHistory,
};
pub use router::{screening_router, ScreeningRequest};
