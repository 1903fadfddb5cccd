// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/` and are public; the dashboard is a
// single-user tool with no authentication.
//
//   GET /api/v1/health   liveness + uptime
//   GET /api/v1/options  tickers, indicators, slider bounds and defaults
//   GET /api/v1/chart    fetch + compute one chart payload
//
// CORS is permissive so that a separately served front end can call in.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::app_state::AppContext;
use crate::chart::{build_chart, ChartPayload};
use crate::runtime_config::IndicatorParams;
use crate::types::{parse_indicator_list, Indicator};

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared context.
pub fn router(ctx: Arc<AppContext>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/options", get(options))
        .route("/api/v1/chart", get(chart))
        .layer(cors)
        .with_state(ctx)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    server_time: i64,
    uptime_secs: u64,
}

async fn health(State(ctx): State<Arc<AppContext>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        server_time: chrono::Utc::now().timestamp_millis(),
        uptime_secs: ctx.uptime_secs(),
    })
}

// =============================================================================
// Options — everything the control panel needs to render itself
// =============================================================================

#[derive(Serialize)]
struct SliderSpec {
    id: &'static str,
    indicator: Indicator,
    label: &'static str,
    min: f64,
    max: f64,
    step: f64,
    default: f64,
}

#[derive(Serialize)]
struct IndicatorOption {
    id: Indicator,
    label: &'static str,
}

#[derive(Serialize)]
struct OptionsResponse {
    symbols: Vec<String>,
    indicators: Vec<IndicatorOption>,
    default_start: NaiveDate,
    default_end: NaiveDate,
    sliders: Vec<SliderSpec>,
}

/// Slider bounds paired with the configured defaults.
fn slider_specs(d: &IndicatorParams) -> Vec<SliderSpec> {
    let spec = |id, indicator, label, min, max, step, default| SliderSpec {
        id,
        indicator,
        label,
        min,
        max,
        step,
        default,
    };
    vec![
        spec("bb_n", Indicator::Bollinger, "N — Periods", 1.0, 40.0, 1.0, d.bb_n),
        spec("bb_k", Indicator::Bollinger, "k — Std Dev", 0.5, 4.0, 0.5, d.bb_k),
        spec("macd_fast", Indicator::Macd, "Fast Period", 2.0, 50.0, 1.0, d.macd_fast),
        spec("macd_slow", Indicator::Macd, "Slow Period", 2.0, 50.0, 1.0, d.macd_slow),
        spec("macd_signal", Indicator::Macd, "Signal Period", 2.0, 50.0, 1.0, d.macd_signal),
        spec("rsi_period", Indicator::Rsi, "RSI Period", 2.0, 50.0, 1.0, d.rsi_period),
        spec("rsi_upper", Indicator::Rsi, "Upper Threshold", 50.0, 100.0, 1.0, d.rsi_upper),
        spec("rsi_lower", Indicator::Rsi, "Lower Threshold", 1.0, 50.0, 1.0, d.rsi_lower),
    ]
}

async fn options(State(ctx): State<Arc<AppContext>>) -> impl IntoResponse {
    let cfg = &ctx.config;
    Json(OptionsResponse {
        symbols: cfg.symbols.clone(),
        indicators: Indicator::ALL
            .iter()
            .map(|&id| IndicatorOption {
                id,
                label: id.label(),
            })
            .collect(),
        default_start: cfg.default_start,
        default_end: cfg.default_end,
        sliders: slider_specs(&cfg.defaults),
    })
}

// =============================================================================
// Chart
// =============================================================================

#[derive(Debug, Default, Deserialize)]
struct ChartQuery {
    symbol: Option<String>,
    start: Option<String>,
    end: Option<String>,
    /// Comma-separated; absent means all three, empty means none.
    indicators: Option<String>,
    bb_n: Option<f64>,
    bb_k: Option<f64>,
    macd_fast: Option<f64>,
    macd_slow: Option<f64>,
    macd_signal: Option<f64>,
    rsi_period: Option<f64>,
    rsi_upper: Option<f64>,
    rsi_lower: Option<f64>,
    request_id: Option<String>,
}

impl ChartQuery {
    /// Overlay the supplied knobs on the configured defaults.
    fn params(&self, defaults: &IndicatorParams) -> IndicatorParams {
        IndicatorParams {
            bb_n: self.bb_n.unwrap_or(defaults.bb_n),
            bb_k: self.bb_k.unwrap_or(defaults.bb_k),
            macd_fast: self.macd_fast.unwrap_or(defaults.macd_fast),
            macd_slow: self.macd_slow.unwrap_or(defaults.macd_slow),
            macd_signal: self.macd_signal.unwrap_or(defaults.macd_signal),
            rsi_period: self.rsi_period.unwrap_or(defaults.rsi_period),
            rsi_upper: self.rsi_upper.unwrap_or(defaults.rsi_upper),
            rsi_lower: self.rsi_lower.unwrap_or(defaults.rsi_lower),
        }
    }
}

/// Parse a date picker value. Only the leading `YYYY-MM-DD` is used, so full
/// ISO timestamps are accepted too.
fn parse_day(field: &str, raw: &str) -> ApiResult<NaiveDate> {
    let raw = raw.trim();
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| ApiError::BadRequest(format!("invalid {field} date '{raw}': {e}")))
}

fn non_blank(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

async fn chart(
    State(ctx): State<Arc<AppContext>>,
    Query(q): Query<ChartQuery>,
) -> ApiResult<Json<ChartPayload>> {
    let request_id = non_blank(&q.request_id)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    // Incomplete selection: render nothing rather than fail.
    let (Some(raw_symbol), Some(raw_start), Some(raw_end)) =
        (non_blank(&q.symbol), non_blank(&q.start), non_blank(&q.end))
    else {
        return Ok(Json(ChartPayload::empty(
            request_id,
            non_blank(&q.symbol).unwrap_or_default(),
        )));
    };

    let symbol = ctx
        .config
        .resolve_symbol(raw_symbol)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown symbol '{raw_symbol}'")))?
        .to_string();
    let start = parse_day("start", raw_start)?;
    let end = parse_day("end", raw_end)?;

    let indicators = match q.indicators.as_deref() {
        Some(raw) => parse_indicator_list(raw).map_err(ApiError::BadRequest)?,
        None => Indicator::ALL.to_vec(),
    };
    let params = q.params(&ctx.config.defaults);

    let series = ctx.fetcher.fetch(&symbol, start, end).await;
    let payload = build_chart(request_id, &symbol, &series, &indicators, &params);

    info!(
        request_id = %payload.request_id,
        symbol = %symbol,
        %start,
        %end,
        rows = payload.dates.len(),
        empty = payload.empty,
        "chart built"
    );

    Ok(Json(payload))
}
