use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use crediflow::config::AppConfig;
use crediflow::error::AppError;
use crediflow::screening::{
    never_cancelled, ApplicantProfile, BankDirectory, BureauClient, BureauConfig,
    EmploymentCategory, MemoryDelinquencyRegistry, MemoryHistory, ScreeningConfig,
    ScreeningService, screening_router,
};
use crediflow::telemetry;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

type Service = ScreeningService<BureauClient, MemoryDelinquencyRegistry, MemoryHistory>;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "crediflow",
    about = "Screen short-term loan applications from the command line or over HTTP",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Evaluate a single applicant and print the outcome
    Screen(ScreenArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct ScreenArgs {
    /// Applicant full name
    #[arg(long)]
    name: String,
    /// 7-8 digit person identifier or 11-digit tax identifier
    #[arg(long)]
    national_id: String,
    /// Net monthly income in currency units
    #[arg(long)]
    income: u64,
    /// Employment category: public, private, retiree, or unset
    #[arg(long, value_parser = parse_employment, default_value = "unset")]
    employment: EmploymentCategory,
    /// Province of residence
    #[arg(long, default_value = "")]
    province: String,
    /// Payer bank identifier (see the standard bank table)
    #[arg(long)]
    bank: String,
    /// Bank account number, when the payer bank requires one
    #[arg(long)]
    account: Option<String>,
    /// Operator identity recorded with the evaluation
    #[arg(long, default_value = "cli")]
    operator: String,
}

fn parse_employment(raw: &str) -> Result<EmploymentCategory, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "public" | "public_sector" => Ok(EmploymentCategory::PublicSector),
        "private" | "private_sector" => Ok(EmploymentCategory::PrivateSector),
        "retiree" => Ok(EmploymentCategory::Retiree),
        "" | "unset" => Ok(EmploymentCategory::Unset),
        other => Err(format!(
            "unknown employment category '{other}' (expected public, private, retiree, or unset)"
        )),
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Screen(args) => run_screen(args).await,
    }
}

fn build_service(config: &AppConfig) -> Result<Arc<Service>, AppError> {
    let bureau = BureauClient::new(BureauConfig {
        base_url: config.bureau.base_url.clone(),
        token: config.bureau.token.clone(),
        attempt_timeout: config.bureau.attempt_timeout,
        max_attempts: config.bureau.max_attempts,
        backoff_unit: config.bureau.backoff_unit,
    })?;

    let screening = ScreeningConfig {
        stage_delay: config.screening.stage_delay,
        account_block_probability: config.screening.account_block_probability,
        cap_disqualified: config.screening.cap_disqualified,
    };

    Ok(Arc::new(ScreeningService::new(
        Arc::new(bureau),
        Arc::new(MemoryDelinquencyRegistry::default()),
        Arc::new(MemoryHistory::default()),
        Arc::new(BankDirectory::standard()),
        screening,
    )))
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let service = build_service(&config)?;
    let simulated = config.bureau.token.is_none();

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(screening_router(service))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, simulated_bureau = simulated, "loan screening service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn run_screen(args: ScreenArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let service = build_service(&config)?;

    let profile = ApplicantProfile {
        full_name: args.name,
        national_id: args.national_id,
        net_monthly_income: args.income,
        employment: args.employment,
        province: args.province,
        bank_id: args.bank,
        bank_account: args.account,
    };

    let outcome = service
        .evaluate(&profile, &args.operator, never_cancelled())
        .await;

    println!("Decision: {}", outcome.decision.label());
    if let Some(amount) = outcome.max_amount {
        println!("Maximum approved amount: {amount}");
    }
    if let Some(reason) = &outcome.reason {
        println!("Reason: {reason}");
    }

    println!("\nStage results");
    for entry in &outcome.stages {
        let marker = if entry.result.is_not_evaluated() {
            "-"
        } else if entry.result.passed {
            "ok"
        } else {
            "fail"
        };
        println!(
            "- {} [{}]: {}",
            entry.stage.label(),
            marker,
            entry.result.message
        );
    }

    if !outcome.amount_trail.is_empty() {
        println!("\nAmount caps");
        for cap in &outcome.amount_trail {
            let marker = if cap.applied { "applied" } else { "considered" };
            println!("- {} ({}): {}", cap.rule, marker, cap.cap);
        }
    }

    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
