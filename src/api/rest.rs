// =============================================================================
// REST API Endpoints: Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/`. Market data goes through the AppState
// kline cache; analysis runs synchronously on the cached candles inside the
// handler. Every failure is a JSON body of the form `{ "error": "..." }`.
//
// CORS is permissive; the dashboard is served from another origin.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::analysis::{analyze, MarketAnalysis};
use crate::app_state::AppState;
use crate::types::TimeFrame;

/// Largest `limit` forwarded to the klines endpoint.
const MAX_KLINE_LIMIT: u32 = 1500;

type ApiError = (StatusCode, Json<serde_json::Value>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(serde_json::json!({ "error": message.into() })))
}

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/klines", get(klines))
        .route("/api/ticker", get(ticker))
        .route("/api/analysis", get(analysis))
        .route("/api/state", get(full_state))
        .route("/api/state/timeframe", post(set_timeframe))
        .route("/api/state/coin", post(set_coin))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        state_version: state.current_state_version(),
        server_time: chrono::Utc::now().timestamp_millis(),
    })
}

// =============================================================================
// Market data
// =============================================================================

#[derive(Debug, Deserialize)]
struct KlinesQuery {
    symbol: Option<String>,
    interval: Option<String>,
    limit: Option<u32>,
}

fn required(value: Option<String>, name: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, format!("missing '{name}' parameter")))
}

async fn klines(
    State(state): State<Arc<AppState>>,
    Query(query): Query<KlinesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let symbol = required(query.symbol, "symbol")?.to_uppercase();
    let interval = required(query.interval, "interval")?;
    let default_limit = state.runtime_config.read().kline_limit;
    let limit = query.limit.unwrap_or(default_limit).clamp(1, MAX_KLINE_LIMIT);

    let candles = state
        .get_or_fetch_klines(&symbol, &interval, limit)
        .await
        .map_err(|e| {
            warn!(%symbol, %interval, error = %e, "klines request failed");
            state.push_error(format!("klines {symbol} {interval}: {e:#}"));
            api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("failed to fetch klines: {e}"))
        })?;

    Ok(Json(candles))
}

#[derive(Debug, Deserialize)]
struct TickerQuery {
    symbol: Option<String>,
}

async fn ticker(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TickerQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let symbol = required(query.symbol, "symbol")?.to_uppercase();

    let ticker = state.client.get_ticker(&symbol).await.map_err(|e| {
        warn!(%symbol, error = %e, "ticker request failed");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("failed to fetch ticker: {e}"))
    })?;

    Ok(Json(ticker))
}

// =============================================================================
// Analysis
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisResponse {
    symbol: String,
    interval: TimeFrame,
    #[serde(flatten)]
    analysis: MarketAnalysis,
}

/// `interval` falls back to the selected timeframe, `limit` to the configured
/// kline limit.
async fn analysis(
    State(state): State<Arc<AppState>>,
    Query(query): Query<KlinesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let symbol = required(query.symbol, "symbol")?.to_uppercase();
    let timeframe = match query.interval {
        Some(raw) => raw
            .parse::<TimeFrame>()
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?,
        None => state.selected_timeframe(),
    };
    let (default_limit, params) = {
        let config = state.runtime_config.read();
        (config.kline_limit, config.analysis.clone())
    };
    let limit = query.limit.unwrap_or(default_limit).clamp(1, MAX_KLINE_LIMIT);

    let candles = state
        .get_or_fetch_klines(&symbol, timeframe.as_str(), limit)
        .await
        .map_err(|e| {
            warn!(%symbol, %timeframe, error = %e, "analysis fetch failed");
            state.push_error(format!("analysis {symbol} {timeframe}: {e:#}"));
            api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("failed to fetch klines: {e}"))
        })?;

    let analysis = analyze(&candles, timeframe, &params);
    info!(
        %symbol,
        %timeframe,
        action = %analysis.trading_signal.action,
        score = analysis.trading_signal.score,
        "analysis served"
    );

    Ok(Json(AnalysisResponse {
        symbol,
        interval: timeframe,
        analysis,
    }))
}

// =============================================================================
// State
// =============================================================================

async fn full_state(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.build_snapshot())
}

#[derive(Debug, Deserialize)]
struct TimeframeRequest {
    timeframe: String,
}

async fn set_timeframe(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TimeframeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let timeframe: TimeFrame = req
        .timeframe
        .parse()
        .map_err(|e: anyhow::Error| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    state.set_selected_timeframe(timeframe);
    info!(%timeframe, "selected timeframe changed via API");
    Ok(Json(state.build_snapshot()))
}

/// `{"coin": null}` clears the selection.
#[derive(Debug, Deserialize)]
struct CoinRequest {
    #[serde(default)]
    coin: Option<String>,
}

async fn set_coin(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CoinRequest>,
) -> impl IntoResponse {
    let coin = req
        .coin
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty());

    info!(coin = ?coin, "selected coin changed via API");
    state.set_selected_coin(coin);
    Json(state.build_snapshot())
}
