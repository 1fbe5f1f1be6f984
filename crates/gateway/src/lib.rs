//! HTTP API gateway for HabitCoach.
//!
//! Exposes the coach endpoints under `/v1` plus a health check.
//!
//! Built on Axum for high performance async HTTP.

pub mod api_v1;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    http::{HeaderName, Method, StatusCode, header},
    middleware::{self, Next},
    response::Json,
    routing::get,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use habitcoach_agent::CoachPipeline;
use habitcoach_config::{AppConfig, GatewayConfig};
use habitcoach_core::catalog::ExerciseCatalog;
use habitcoach_telemetry::TelemetryEngine;

/// Header the app sends to identify the user for rate limiting.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Build the full router: health check plus the v1 API.
///
/// Layers applied:
/// - Request body size limit (`gateway.max_body_bytes`)
/// - In-memory rate limiting per client (`gateway.rate_limit_per_minute`)
/// - CORS for the app's own headers
/// - HTTP trace logging
pub fn build_router(state: api_v1::SharedApiState, gateway: &GatewayConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(USER_ID_HEADER),
        ])
        .max_age(Duration::from_secs(3600));

    let rate_limiter = Arc::new(RateLimiter::new(
        gateway.rate_limit_per_minute as usize,
        Duration::from_secs(60),
    ));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/v1", api_v1::v1_router(state))
        .layer(DefaultBodyLimit::max(gateway.max_body_bytes))
        .layer(middleware::from_fn(move |req, next| {
            let limiter = rate_limiter.clone();
            rate_limit_middleware(limiter, req, next)
        }))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
///
/// Builds the provider, backends, catalog and pipeline once and shares
/// them across requests.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let selection = habitcoach_providers::select(&config)?;
    if !selection.has_key {
        warn!(
            provider = %selection.name,
            "No API key configured; model calls will fail and requests will be served by fallbacks"
        );
    }

    let backends = habitcoach_store::build_from_config(&config).await?;

    let catalog = match &config.catalog_path {
        Some(path) => ExerciseCatalog::load(path)?,
        None => ExerciseCatalog::builtin(),
    };

    let telemetry = Arc::new(TelemetryEngine::with_capacity(config.telemetry.recent_events));
    let mut pipeline = CoachPipeline::new(
        &config,
        selection.provider(),
        backends.store,
        backends.ledger,
        Arc::new(catalog),
    );
    if config.telemetry.enabled {
        pipeline = pipeline.with_telemetry(telemetry.clone());
    }

    info!(
        provider = pipeline.provider_name(),
        model = pipeline.model(),
        "Coach pipeline ready"
    );

    let state = Arc::new(api_v1::ApiV1State::new(Arc::new(pipeline), telemetry));
    let app = build_router(state, &config.gateway);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Rate Limiter ---

/// Simple in-memory sliding-window rate limiter.
///
/// Tracks request timestamps per client key.
/// Thread-safe via `std::sync::Mutex` (non-async, held briefly).
struct RateLimiter {
    max_requests: usize,
    window: Duration,
    clients: std::sync::Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Check if the client is within rate limits. Returns `true` if allowed.
    fn check(&self, client_key: &str) -> bool {
        let now = Instant::now();
        let mut clients = self.clients.lock().unwrap_or_else(|e| e.into_inner());

        // Periodic cleanup: if map grows too large, evict stale entries
        if clients.len() > 10_000 {
            clients.retain(|_, timestamps| {
                timestamps
                    .last()
                    .is_some_and(|t| now.duration_since(*t) < self.window)
            });
        }

        let timestamps = clients.entry(client_key.to_string()).or_default();
        timestamps.retain(|t| now.duration_since(*t) < self.window);

        if timestamps.len() >= self.max_requests {
            return false;
        }

        timestamps.push(now);
        true
    }
}

/// Rate limiting middleware. The client key is the `X-User-Id` header, then
/// the Authorization header, then "anonymous". `/health` is exempt.
async fn rate_limit_middleware(
    limiter: Arc<RateLimiter>,
    req: axum::extract::Request,
    next: Next,
) -> Result<axum::response::Response, (StatusCode, Json<habitcoach_core::api::ErrorBody>)> {
    if req.uri().path() == "/health" {
        return Ok(next.run(req).await);
    }

    let client_key = [USER_ID_HEADER, header::AUTHORIZATION.as_str()]
        .iter()
        .find_map(|name| req.headers().get(*name).and_then(|v| v.to_str().ok()))
        .map(|s| s.to_string())
        .unwrap_or_else(|| "anonymous".to_string());

    if !limiter.check(&client_key) {
        warn!(client = %client_key.chars().take(20).collect::<String>(), "Rate limit exceeded");
        return Err((
            StatusCode::TOO_MANY_REQUESTS,
            Json(habitcoach_core::api::ErrorBody::new("Too many requests, slow down")),
        ));
    }

    Ok(next.run(req).await)
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
