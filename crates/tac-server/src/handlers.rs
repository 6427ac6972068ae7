//! HTTP request handlers for the verification service.
//!
//! Implements the claim verification proxy plus the ledger, risk and
//! health endpoints using axum.

use crate::config::{ApiKey, API_KEY_ENV};
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router as AxumRouter,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tac_domain::risk::SimulationInput;
use tac_domain::scoring::{
    justification_or_fallback, placeholder_credibility, RECOMMENDATIONS, RISK_LEVEL,
};
use tac_domain::traits::LedgerStore;
use tac_domain::{
    LedgerStats, LogLevel, PromptBuilder, RateAdjustment, RiskCalculator, RiskMetrics,
    RiskMetricsUpdate, Source, SystemLog, UserRole, VerificationRecord, VerificationRequest,
    VerificationResult,
};
use tac_llm::{LlmError, TextGenerator};
use tac_store::{InMemoryLedger, StoreError};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Path of the verification proxy
pub const PROXY_PATH: &str = "/api/gemini-proxy";

/// Log source for verification events
const VERIFICATION_AGENT: &str = "Verification Agent";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Upstream text generator
    pub generator: Arc<dyn TextGenerator>,
    /// Upstream credential; `None` makes every verification fail closed
    pub api_key: Option<ApiKey>,
    /// Process-local ledger
    pub ledger: Arc<InMemoryLedger>,
    /// Whether the upstream is asked for grounded sources
    pub grounding: bool,
}

/// Successful verification response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResponse {
    /// Placeholder credibility score in [70, 100)
    pub credibility: u32,
    /// Model justification
    pub justification: String,
    /// Fixed recommendations
    pub recommendations: Vec<String>,
    /// Fixed risk level
    pub risk_level: String,
    /// Claim as submitted
    pub claim: String,
    /// RFC 3339 UTC timestamp
    pub timestamp: String,
    /// Grounded sources; omitted when grounding is off
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResponse {
    /// Overall health status
    pub status: String,
    /// Whether an upstream credential is present
    pub upstream_configured: bool,
    /// Whether grounding is enabled
    pub grounding: bool,
}

/// Role-labelled dashboard summary
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    /// Role the summary is labelled for
    pub role: UserRole,
    /// Greeting
    pub welcome_message: String,
    /// Title of the capacity card
    pub capacity_title: String,
    /// Title of the rate card
    pub rate_title: String,
    /// Current risk profile
    pub risk_profile: RiskMetrics,
    /// Rate adjustment at the default weight
    pub rate_adjustment: RateAdjustment,
    /// Ledger statistics
    pub stats: LedgerStats,
}

/// Query string of the dashboard endpoint
#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    /// Role name; defaults to borrower
    pub role: Option<String>,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error summary
    pub error: String,
    /// Detail message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Claim missing or empty
    MissingClaim,
    /// Unsupported HTTP method
    MethodNotAllowed,
    /// Upstream credential not configured
    NotConfigured,
    /// Upstream call failed
    Upstream(LlmError),
    /// Ledger error
    Store(StoreError),
    /// Malformed input on the auxiliary endpoints
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            AppError::MissingClaim => (StatusCode::BAD_REQUEST, "Claim is required".to_string(), None),
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "Method not allowed".to_string(),
                None,
            ),
            AppError::NotConfigured => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "API key not configured".to_string(),
                Some(format!("Please set {} environment variable", API_KEY_ENV)),
            ),
            AppError::Upstream(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to verify claim".to_string(),
                Some(e.to_string()),
            ),
            AppError::Store(StoreError::InvalidMetrics(msg)) => {
                (StatusCode::BAD_REQUEST, "Invalid risk metrics".to_string(), Some(msg))
            }
            AppError::Store(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Ledger unavailable".to_string(),
                Some(e.to_string()),
            ),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "Invalid request".to_string(), Some(msg))
            }
        };

        let body = Json(ErrorResponse { error, message });
        (status, body).into_response()
    }
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        AppError::Upstream(e)
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Store(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::BadRequest(e.body_text())
    }
}

/// Extract the claim and optional context from a raw body
///
/// Anything that is not a JSON object with a non-empty string `claim`
/// counts as a missing claim. A non-string `context` is ignored.
fn parse_verification_request(body: &[u8]) -> Option<VerificationRequest> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let claim = value.get("claim")?.as_str()?;
    let request = VerificationRequest::new(claim)?;

    Some(match value.get("context").and_then(Value::as_str) {
        Some(context) => request.with_context(context),
        None => request,
    })
}

/// POST /api/gemini-proxy - Verify a sustainability claim
async fn verify_claim(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<VerificationResponse>, AppError> {
    let request = parse_verification_request(&body).ok_or_else(|| {
        warn!("Rejected verification request without claim");
        AppError::MissingClaim
    })?;

    let api_key = state.api_key.as_ref().ok_or_else(|| {
        error!("{} is not set; refusing to call upstream", API_KEY_ENV);
        AppError::NotConfigured
    })?;

    let builder = PromptBuilder::new(&request);
    let prompt = builder.build();
    let result = state
        .generator
        .generate(api_key.expose(), &prompt, builder.system_instruction())
        .await
        .map_err(|e| {
            error!("Upstream verification failed: {}", e);
            if let Err(store_err) = state.ledger.log(
                LogLevel::Error,
                &format!("Verification failed: {}", e),
                VERIFICATION_AGENT,
            ) {
                warn!("Failed to record error log: {}", store_err);
            }
            AppError::Upstream(e)
        })?;

    let justification = justification_or_fallback(&result.text);
    let sources = if state.grounding {
        result.sources
    } else {
        Vec::new()
    };

    if let Err(e) = state.ledger.record_verification(
        &request.claim,
        VerificationResult {
            text: justification.clone(),
            sources: sources.clone(),
        },
    ) {
        warn!("Failed to record verification: {}", e);
    }

    let credibility = placeholder_credibility(&mut rand::thread_rng());
    info!(
        "Verified claim ({} chars, {} sources, credibility {})",
        request.claim.len(),
        sources.len(),
        credibility
    );

    Ok(Json(VerificationResponse {
        credibility,
        justification,
        recommendations: RECOMMENDATIONS.iter().map(|r| r.to_string()).collect(),
        risk_level: RISK_LEVEL.to_string(),
        claim: request.claim,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        sources,
    }))
}

/// OPTIONS /api/gemini-proxy - CORS preflight
async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Any other method on the proxy path
async fn method_not_allowed(method: Method) -> AppError {
    warn!("Rejected {} on {}", method, PROXY_PATH);
    AppError::MethodNotAllowed
}

/// GET /health - Service health
async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        upstream_configured: state.api_key.is_some(),
        grounding: state.grounding,
    })
}

/// GET /api/verifications - Recorded verifications, newest first
async fn list_verifications(
    State(state): State<AppState>,
) -> Result<Json<Vec<VerificationRecord>>, AppError> {
    Ok(Json(state.ledger.verifications()?))
}

/// GET /api/logs - System log, newest first
async fn list_logs(State(state): State<AppState>) -> Result<Json<Vec<SystemLog>>, AppError> {
    Ok(Json(state.ledger.logs()?))
}

/// GET /api/risk - Current risk profile
async fn get_risk_profile(State(state): State<AppState>) -> Result<Json<RiskMetrics>, AppError> {
    Ok(Json(state.ledger.risk_profile()?))
}

/// PATCH /api/risk - Partial risk profile update
async fn update_risk_profile(
    State(state): State<AppState>,
    payload: Result<Json<RiskMetricsUpdate>, JsonRejection>,
) -> Result<Json<RiskMetrics>, AppError> {
    let Json(update) = payload?;
    Ok(Json(state.ledger.update_risk_profile(&update)?))
}

/// POST /api/risk/simulate - Stateless collateral simulation
async fn simulate_risk(
    payload: Result<Json<SimulationInput>, JsonRejection>,
) -> Result<Json<RateAdjustment>, AppError> {
    let Json(input) = payload?;
    let adjustment = input.simulate().map_err(AppError::BadRequest)?;
    Ok(Json(adjustment))
}

/// GET /api/stats - Dashboard statistics
async fn get_stats(State(state): State<AppState>) -> Result<Json<LedgerStats>, AppError> {
    Ok(Json(state.ledger.stats()?))
}

/// GET /api/dashboard?role= - Role-labelled summary
async fn dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardResponse>, AppError> {
    let role = match query.role.as_deref() {
        Some(raw) => raw.parse::<UserRole>().map_err(AppError::BadRequest)?,
        None => UserRole::default(),
    };

    let risk_profile = state.ledger.risk_profile()?;
    let stats = state.ledger.stats()?;

    Ok(Json(DashboardResponse {
        role,
        welcome_message: role.welcome_message().to_string(),
        capacity_title: role.capacity_title().to_string(),
        rate_title: role.rate_title().to_string(),
        risk_profile,
        rate_adjustment: RiskCalculator::default().adjust_metrics(&risk_profile),
        stats,
    }))
}

/// Permissive CORS: any origin, POST/GET/OPTIONS
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::GET, Method::OPTIONS])
        .allow_headers(Any)
}

/// Create the axum router with all routes
pub fn create_router(state: AppState) -> AxumRouter {
    AxumRouter::new()
        .route(
            PROXY_PATH,
            post(verify_claim)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .route("/health", get(health_check))
        .route("/api/verifications", get(list_verifications))
        .route("/api/logs", get(list_logs))
        .route("/api/risk", get(get_risk_profile).patch(update_risk_profile))
        .route("/api/risk/simulate", post(simulate_risk))
        .route("/api/stats", get(get_stats))
        .route("/api/dashboard", get(dashboard))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
