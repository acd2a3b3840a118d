use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::screening::bureau::{BureauError, BureauGateway};
use crate::screening::domain::{ApplicantProfile, BureauSummary, EmploymentCategory};
use crate::screening::orchestrator::{ScreeningConfig, ScreeningService};
use crate::screening::registry::{
    BankDirectory, DelinquencyRecord, MemoryDelinquencyRegistry, MemoryHistory,
};

pub(super) fn profile(
    income: u64,
    employment: EmploymentCategory,
    bank: &str,
) -> ApplicantProfile {
    ApplicantProfile {
        full_name: "Ana Pereyra".to_string(),
        national_id: "30123456".to_string(),
        net_monthly_income: income,
        employment,
        province: "Córdoba".to_string(),
        bank_id: bank.to_string(),
        bank_account: Some("0012-345678".to_string()),
    }
}

pub(super) fn summary(tier_counts: [u32; 5], total_amount: f64) -> BureauSummary {
    BureauSummary {
        tier_counts,
        total_entities: tier_counts.iter().sum(),
        total_amount,
        disqualified: tier_counts[4] > 0,
    }
}

pub(super) enum StubResponse {
    Summary(BureauSummary),
    HttpExhausted(u16),
    Cancelled,
}

/// Gateway double returning a fixed response for every query.
pub(super) struct StubBureau {
    response: StubResponse,
}

impl StubBureau {
    pub(super) fn with_summary(summary: BureauSummary) -> Self {
        Self {
            response: StubResponse::Summary(summary),
        }
    }

    pub(super) fn failing_http(status: u16) -> Self {
        Self {
            response: StubResponse::HttpExhausted(status),
        }
    }

    pub(super) fn cancelled() -> Self {
        Self {
            response: StubResponse::Cancelled,
        }
    }
}

#[async_trait]
impl BureauGateway for StubBureau {
    async fn query(
        &self,
        _tax_id: &str,
        _cancel: watch::Receiver<bool>,
    ) -> Result<BureauSummary, BureauError> {
        match &self.response {
            StubResponse::Summary(summary) => Ok(summary.clone()),
            StubResponse::HttpExhausted(status) => Err(BureauError::MaxRetriesExceeded {
                attempts: 3,
                last: Box::new(BureauError::Http { status: *status }),
            }),
            StubResponse::Cancelled => Err(BureauError::Cancelled),
        }
    }
}

pub(super) fn test_config() -> ScreeningConfig {
    ScreeningConfig {
        stage_delay: Duration::ZERO,
        account_block_probability: 0.0,
        cap_disqualified: false,
    }
}

pub(super) type TestService =
    ScreeningService<StubBureau, MemoryDelinquencyRegistry, MemoryHistory>;

pub(super) fn service(bureau: StubBureau, registry: MemoryDelinquencyRegistry) -> TestService {
    service_with(bureau, registry, test_config())
}

pub(super) fn service_with(
    bureau: StubBureau,
    registry: MemoryDelinquencyRegistry,
    config: ScreeningConfig,
) -> TestService {
    ScreeningService::new(
        Arc::new(bureau),
        Arc::new(registry),
        Arc::new(MemoryHistory::default()),
        Arc::new(BankDirectory::standard()),
        config,
    )
}

pub(super) async fn read_json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn delinquent_registry(national_id: &str, amount: f64) -> MemoryDelinquencyRegistry {
    MemoryDelinquencyRegistry::new([(
        national_id.to_string(),
        DelinquencyRecord {
            has_active_debt: true,
            amount,
        },
    )])
}
