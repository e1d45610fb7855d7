mod error;
mod store;
mod validate;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{
        Json, Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::core::{
    BuydInputs, DebtPayoffParams, PriorityParams, PropertyAssumptions, calculate_metrics,
    compute_amortization, priority_order, simulate_buyd, simulate_debt_payoff,
};

pub use error::{ApiError, Result};
pub use store::{
    CalculatorInputs, DebtSummary, InMemoryScenarioStore, NewScenario, PropertySummary,
    SavedScenario, ScenarioStore, ScenarioSummary, sample_property, seed_if_empty,
};
pub use validate::{
    MAX_BUYD_YEARS, MAX_LOAN_TERM_YEARS, MAX_PAYOFF_MONTHS, validate_buyd, validate_debt,
    validate_loan_term, validate_property,
};

pub type SharedStore = Arc<dyn ScenarioStore>;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AmortizationPayload {
    principal: f64,
    annual_rate_percent: f64,
    term_years: u32,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/amortization", post(amortization_handler))
        .route("/api/property", post(property_handler))
        .route("/api/buyd", post(buyd_handler))
        .route("/api/debt", post(debt_handler))
        .route("/api/debt/priority", post(priority_handler))
        .route(
            "/api/scenarios",
            get(list_scenarios_handler).post(create_scenario_handler),
        )
        .route(
            "/api/scenarios/:id",
            get(get_scenario_handler).delete(delete_scenario_handler),
        )
        .fallback(not_found_handler)
        .with_state(store)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_http_server(addr: SocketAddr, store: SharedStore) -> std::io::Result<()> {
    let app = router(store);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("fincalc HTTP API listening on http://{addr}");
    tracing::info!("Local access: http://127.0.0.1:{}/", addr.port());

    axum::serve(listener, app).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn amortization_handler(
    payload: std::result::Result<Json<AmortizationPayload>, JsonRejection>,
) -> Result<Response> {
    let Json(payload) = payload?;
    validate_loan_term(payload.term_years)?;
    let amortization = compute_amortization(
        payload.principal,
        payload.annual_rate_percent,
        payload.term_years,
    );
    tracing::debug!(
        years = amortization.yearly_schedule.len(),
        monthly_payment = amortization.monthly_payment,
        "amortization computed"
    );
    Ok(json_response(StatusCode::OK, amortization))
}

async fn property_handler(
    payload: std::result::Result<Json<PropertyAssumptions>, JsonRejection>,
) -> Result<Response> {
    let Json(assumptions) = payload?;
    validate_property(&assumptions)?;
    let result = calculate_metrics(&assumptions);
    tracing::debug!(
        score = result.investment_score,
        stress_test_pass = result.stress_test_pass,
        "property metrics computed"
    );
    Ok(json_response(StatusCode::OK, result))
}

async fn buyd_handler(
    payload: std::result::Result<Json<BuydInputs>, JsonRejection>,
) -> Result<Response> {
    let Json(inputs) = payload?;
    validate_buyd(&inputs)?;
    let result = simulate_buyd(&inputs);
    tracing::debug!(
        years = result.years.len(),
        break_year = ?result.summary.break_year,
        "buyd simulated"
    );
    Ok(json_response(StatusCode::OK, result))
}

async fn debt_handler(
    payload: std::result::Result<Json<DebtPayoffParams>, JsonRejection>,
) -> Result<Response> {
    let Json(params) = payload?;
    validate_debt(&params)?;
    let result = simulate_debt_payoff(&params);
    tracing::debug!(
        debts = params.debts.len(),
        months = result.total_months,
        "debt payoff simulated"
    );
    Ok(json_response(StatusCode::OK, result))
}

async fn priority_handler(
    payload: std::result::Result<Json<PriorityParams>, JsonRejection>,
) -> Result<Response> {
    let Json(params) = payload?;
    Ok(json_response(StatusCode::OK, priority_order(&params)))
}

async fn list_scenarios_handler(State(store): State<SharedStore>) -> Result<Response> {
    let scenarios = store.list()?;
    Ok(json_response(StatusCode::OK, scenarios))
}

async fn create_scenario_handler(
    State(store): State<SharedStore>,
    payload: std::result::Result<Json<NewScenario>, JsonRejection>,
) -> Result<Response> {
    let Json(scenario) = payload?;
    let saved = store.create(scenario)?;
    tracing::info!(id = saved.id, title = %saved.title, "scenario saved");
    Ok(json_response(StatusCode::CREATED, saved))
}

async fn get_scenario_handler(
    State(store): State<SharedStore>,
    id: std::result::Result<Path<u64>, PathRejection>,
) -> Result<Response> {
    let Path(id) = id?;
    let scenario = store
        .get(id)?
        .ok_or_else(|| ApiError::NotFound(format!("Scenario {id} not found")))?;
    Ok(json_response(StatusCode::OK, scenario))
}

async fn delete_scenario_handler(
    State(store): State<SharedStore>,
    id: std::result::Result<Path<u64>, PathRejection>,
) -> Result<Response> {
    let Path(id) = id?;
    if !store.delete(id)? {
        return Err(ApiError::NotFound(format!("Scenario {id} not found")));
    }
    tracing::info!(id, "scenario deleted");
    Ok(with_cache_control(StatusCode::NO_CONTENT))
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
