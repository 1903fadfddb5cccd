// =============================================================================
// Chart Assembly — OHLC series + selected indicators -> renderer payload
// =============================================================================
//
// The payload is renderer-agnostic: parallel arrays keyed by date, with
// `null` wherever an indicator is undefined.  The candlestick panel is always
// present; MACD and RSI each add one stacked panel below it, while Bollinger
// Bands overlay the candles.
// =============================================================================

use chrono::NaiveDate;
use serde::Serialize;

use crate::indicators::{bollinger_bands, calculate_macd, calculate_rsi, Series};
use crate::market_data::OhlcSeries;
use crate::runtime_config::{window_len, IndicatorParams};
use crate::types::Indicator;

#[derive(Debug, Clone, Serialize)]
pub struct BollingerPanel {
    pub n: f64,
    pub k: f64,
    pub upper: Series,
    pub mid: Series,
    pub lower: Series,
}

#[derive(Debug, Clone, Serialize)]
pub struct MacdPanel {
    pub fast: f64,
    pub slow: f64,
    pub signal: f64,
    pub macd: Series,
    pub signal_line: Series,
    pub histogram: Series,
    /// Bar colour class per point: "up" (>= 0), "down" (< 0), or null.
    pub histogram_sign: Vec<Option<&'static str>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RsiPanel {
    pub period: f64,
    pub upper_threshold: f64,
    pub lower_threshold: f64,
    pub values: Series,
}

/// Everything the renderer needs for one chart.
#[derive(Debug, Clone, Serialize)]
pub struct ChartPayload {
    /// Echo of the caller's request identifier, for discarding stale replies.
    pub request_id: String,
    pub symbol: String,
    /// `true` when no price data was available; nothing should be drawn.
    pub empty: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<&'static str>,
    /// Number of stacked chart rows.
    pub panels: usize,
    pub dates: Vec<NaiveDate>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bollinger: Option<BollingerPanel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd: Option<MacdPanel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi: Option<RsiPanel>,
}

impl ChartPayload {
    /// The "render nothing" payload.
    pub fn empty(request_id: String, symbol: impl Into<String>) -> Self {
        Self {
            request_id,
            symbol: symbol.into(),
            empty: true,
            source: None,
            panels: 0,
            dates: Vec::new(),
            open: Vec::new(),
            high: Vec::new(),
            low: Vec::new(),
            close: Vec::new(),
            bollinger: None,
            macd: None,
            rsi: None,
        }
    }
}

/// Build the payload for `series`, computing only the selected indicators.
pub fn build_chart(
    request_id: String,
    symbol: &str,
    series: &OhlcSeries,
    indicators: &[Indicator],
    params: &IndicatorParams,
) -> ChartPayload {
    if series.is_empty() {
        return ChartPayload::empty(request_id, symbol);
    }

    let closes = series.closes();
    let bars = series.bars();
    let wants = |ind: Indicator| indicators.contains(&ind);

    let bollinger = wants(Indicator::Bollinger).then(|| {
        let bb = bollinger_bands(&closes, window_len(params.bb_n), params.bb_k);
        BollingerPanel {
            n: params.bb_n,
            k: params.bb_k,
            upper: bb.upper,
            mid: bb.mid,
            lower: bb.lower,
        }
    });

    let macd = wants(Indicator::Macd).then(|| {
        let m = calculate_macd(
            &closes,
            window_len(params.macd_fast),
            window_len(params.macd_slow),
            window_len(params.macd_signal),
        );
        let histogram_sign = m
            .histogram
            .iter()
            .map(|h| h.map(|h| if h >= 0.0 { "up" } else { "down" }))
            .collect();
        MacdPanel {
            fast: params.macd_fast,
            slow: params.macd_slow,
            signal: params.macd_signal,
            macd: m.macd,
            signal_line: m.signal,
            histogram: m.histogram,
            histogram_sign,
        }
    });

    let rsi = wants(Indicator::Rsi).then(|| RsiPanel {
        period: params.rsi_period,
        upper_threshold: params.rsi_upper,
        lower_threshold: params.rsi_lower,
        values: calculate_rsi(&closes, window_len(params.rsi_period)),
    });

    let panels = 1 + usize::from(macd.is_some()) + usize::from(rsi.is_some());

    ChartPayload {
        request_id,
        symbol: symbol.to_string(),
        empty: false,
        source: series.source(),
        panels,
        dates: series.dates(),
        open: bars.iter().map(|b| b.open).collect(),
        high: bars.iter().map(|b| b.high).collect(),
        low: bars.iter().map(|b| b.low).collect(),
        close: closes,
        bollinger,
        macd,
        rsi,
    }
}
