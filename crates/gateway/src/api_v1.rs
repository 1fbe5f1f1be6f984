//! HTTP API v1: the coach endpoints.
//!
//! Endpoints:
//!
//! - `POST /v1/recommend`: Ranked exercise recommendations
//! - `POST /v1/converse`: One coach reply in a conversation
//! - `POST /v1/analyze`: Analysis of a goal, journal entry or mood note
//! - `GET  /v1/usage`: Outcome and token totals since startup

use axum::{
    Router,
    extract::State,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use std::sync::Arc;
use tracing::{error, info, warn};

use habitcoach_agent::CoachPipeline;
use habitcoach_core::api::{
    AnalyzeRequest, AnalyzeResponse, ConverseRequest, ConverseResponse, ErrorBody, RecommendRequest,
    RecommendResponse,
};
use habitcoach_core::error::Error;
use habitcoach_telemetry::{TelemetryEngine, UsageSnapshot};

// ── State ─────────────────────────────────────────────────────────────────

/// Shared state for the v1 API.
pub struct ApiV1State {
    pub pipeline: Arc<CoachPipeline>,
    pub telemetry: Arc<TelemetryEngine>,
    pub start_time: chrono::DateTime<chrono::Utc>,
}

impl ApiV1State {
    pub fn new(pipeline: Arc<CoachPipeline>, telemetry: Arc<TelemetryEngine>) -> Self {
        Self {
            pipeline,
            telemetry,
            start_time: chrono::Utc::now(),
        }
    }
}

pub type SharedApiState = Arc<ApiV1State>;

type ApiError = (StatusCode, Json<ErrorBody>);

// ── Router ────────────────────────────────────────────────────────────────

/// Build the v1 API router. Nest this under "/v1" in the main router.
pub fn v1_router(state: SharedApiState) -> Router {
    Router::new()
        .route("/recommend", post(recommend_handler))
        .route("/converse", post(converse_handler))
        .route("/analyze", post(analyze_handler))
        .route("/usage", get(usage_handler))
        .with_state(state)
}

// ── Error mapping ─────────────────────────────────────────────────────────

/// Map a pipeline error to its HTTP status and body.
pub fn error_response(err: Error) -> ApiError {
    match err {
        Error::Validation(e) => (StatusCode::BAD_REQUEST, Json(ErrorBody::new(e.to_string()))),
        Error::BudgetExhausted { balance, required } => {
            (StatusCode::FORBIDDEN, Json(ErrorBody::budget(balance, required)))
        }
        Error::Ledger(e) => {
            error!(error = %e, "Token ledger unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorBody::new("Token ledger unavailable, please retry later")),
            )
        }
        other => {
            error!(error = %other, "Coach request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::new("Internal error")),
            )
        }
    }
}

fn bad_body(rejection: JsonRejection) -> ApiError {
    warn!(error = %rejection.body_text(), "Rejected request body");
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody::new(format!("Invalid request body: {}", rejection.body_text()))),
    )
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn recommend_handler(
    State(state): State<SharedApiState>,
    payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> Result<Json<RecommendResponse>, ApiError> {
    let Json(req) = payload.map_err(bad_body)?;
    info!(user = %req.user_id, count = req.requested_count, "v1/recommend request");
    let out = state.pipeline.recommend(&req).await.map_err(error_response)?;
    Ok(Json(out.into_recommend_response()))
}

async fn converse_handler(
    State(state): State<SharedApiState>,
    payload: Result<Json<ConverseRequest>, JsonRejection>,
) -> Result<Json<ConverseResponse>, ApiError> {
    let Json(req) = payload.map_err(bad_body)?;
    info!(
        user = %req.user_id,
        message_len = req.message.len(),
        history = req.past_messages.len(),
        "v1/converse request"
    );
    let out = state.pipeline.converse(&req).await.map_err(error_response)?;
    Ok(Json(out.into_converse_response()))
}

async fn analyze_handler(
    State(state): State<SharedApiState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(req) = payload.map_err(bad_body)?;
    info!(
        user = %req.user_id,
        text_len = req.text.len(),
        context = req.context.as_deref().unwrap_or("general"),
        "v1/analyze request"
    );
    let out = state.pipeline.analyze(&req).await.map_err(error_response)?;
    Ok(Json(out.into_analyze_response()))
}

async fn usage_handler(State(state): State<SharedApiState>) -> Json<UsageSnapshot> {
    Json(state.telemetry.usage_snapshot())
}

// ── Tests ─────────────────────────────────────────────────────────────────
