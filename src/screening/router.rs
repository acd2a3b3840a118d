use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::watch;

use super::bureau::{never_cancelled, BureauGateway};
use super::domain::ApplicantProfile;
use super::orchestrator::ScreeningService;
use super::registry::{DelinquencyRegistry, HistorySink};

/// Router builder exposing HTTP endpoints for screenings and history.
pub fn screening_router<B, R, H>(service: Arc<ScreeningService<B, R, H>>) -> Router
where
    B: BureauGateway + 'static,
    R: DelinquencyRegistry + 'static,
    H: HistorySink + 'static,
{
    Router::new()
        .route(
            "/api/v1/screenings",
            post(screen_handler::<B, R, H>).get(history_handler::<B, R, H>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub struct ScreeningRequest {
    pub operator: String,
    pub profile: ApplicantProfile,
}

pub(crate) async fn screen_handler<B, R, H>(
    State(service): State<Arc<ScreeningService<B, R, H>>>,
    axum::Json(request): axum::Json<ScreeningRequest>,
) -> Response
where
    B: BureauGateway + 'static,
    R: DelinquencyRegistry + 'static,
    H: HistorySink + 'static,
{
    if request.operator.trim().is_empty() {
        let payload = json!({ "error": "operator identity is required" });
        return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
    }

    let cancel: watch::Receiver<bool> = never_cancelled();
    let outcome = service
        .evaluate(&request.profile, request.operator.trim(), cancel)
        .await;
    (StatusCode::OK, axum::Json(outcome)).into_response()
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    20
}

pub(crate) async fn history_handler<B, R, H>(
    State(service): State<Arc<ScreeningService<B, R, H>>>,
    Query(query): Query<HistoryQuery>,
) -> Response
where
    B: BureauGateway + 'static,
    R: DelinquencyRegistry + 'static,
    H: HistorySink + 'static,
{
    match service.history().recent(query.limit) {
        Ok(records) => (StatusCode::OK, axum::Json(records)).into_response(),
        Err(err) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
