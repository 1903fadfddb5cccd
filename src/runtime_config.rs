// =============================================================================
// Runtime Configuration — dashboard settings loaded once at startup
// =============================================================================
//
// Read from `ta_dashboard.json` when present, then overridden by environment
// variables.  All fields carry `#[serde(default)]` so that a partial file (or
// `{}`) still loads.
//
// Environment overrides:
//   PORT                      serving port
//   TA_BIND_HOST              bind address
//   TA_SYMBOLS                comma-separated ticker list
//   TA_PROVIDER_TIMEOUT_SECS  per-provider fetch timeout
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_symbols() -> Vec<String> {
    ["MSFT", "GOOGL", "TSLA", "AAPL", "META"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_bind_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8050
}

fn default_provider_timeout_secs() -> u64 {
    10
}

fn default_primary_base_url() -> String {
    "https://query2.finance.yahoo.com".to_string()
}

fn default_secondary_base_url() -> String {
    "https://stooq.com".to_string()
}

fn default_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2018, 1, 1).expect("valid default start date")
}

fn default_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2018, 12, 31).expect("valid default end date")
}

fn default_bb_n() -> f64 {
    20.0
}

fn default_bb_k() -> f64 {
    2.0
}

fn default_macd_fast() -> f64 {
    12.0
}

fn default_macd_slow() -> f64 {
    26.0
}

fn default_macd_signal() -> f64 {
    9.0
}

fn default_rsi_period() -> f64 {
    14.0
}

fn default_rsi_upper() -> f64 {
    70.0
}

fn default_rsi_lower() -> f64 {
    30.0
}

// =============================================================================
// IndicatorParams
// =============================================================================

/// Every numeric knob the dashboard exposes.
///
/// Periods are kept as `f64` because slider widgets may send `20.0`; they are
/// truncated toward zero at computation time, and anything below 1 is treated
/// as a degenerate window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorParams {
    /// Bollinger window length.
    #[serde(default = "default_bb_n")]
    pub bb_n: f64,

    /// Bollinger standard-deviation multiplier.
    #[serde(default = "default_bb_k")]
    pub bb_k: f64,

    #[serde(default = "default_macd_fast")]
    pub macd_fast: f64,

    #[serde(default = "default_macd_slow")]
    pub macd_slow: f64,

    #[serde(default = "default_macd_signal")]
    pub macd_signal: f64,

    #[serde(default = "default_rsi_period")]
    pub rsi_period: f64,

    /// Overbought guide line; drawn only, never used in the calculation.
    #[serde(default = "default_rsi_upper")]
    pub rsi_upper: f64,

    /// Oversold guide line.
    #[serde(default = "default_rsi_lower")]
    pub rsi_lower: f64,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            bb_n: default_bb_n(),
            bb_k: default_bb_k(),
            macd_fast: default_macd_fast(),
            macd_slow: default_macd_slow(),
            macd_signal: default_macd_signal(),
            rsi_period: default_rsi_period(),
            rsi_upper: default_rsi_upper(),
            rsi_lower: default_rsi_lower(),
        }
    }
}

/// Convert a raw period knob into a window length. Non-finite and sub-1
/// values map to 0, which every indicator treats as fully undefined.
pub fn window_len(raw: f64) -> usize {
    if raw.is_finite() && raw >= 1.0 {
        raw.trunc() as usize
    } else {
        0
    }
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level configuration for the dashboard service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Tickers offered to the user; chart requests for anything else are
    /// rejected.
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,

    #[serde(default = "default_bind_host")]
    pub bind_host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Upper bound for a single provider attempt, in seconds.
    #[serde(default = "default_provider_timeout_secs")]
    pub provider_timeout_secs: u64,

    #[serde(default = "default_primary_base_url")]
    pub primary_base_url: String,

    #[serde(default = "default_secondary_base_url")]
    pub secondary_base_url: String,

    /// Date range pre-selected in the UI.
    #[serde(default = "default_start")]
    pub default_start: NaiveDate,

    #[serde(default = "default_end")]
    pub default_end: NaiveDate,

    /// Indicator parameters used when a request omits them.
    #[serde(default)]
    pub defaults: IndicatorParams,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            bind_host: default_bind_host(),
            port: default_port(),
            provider_timeout_secs: default_provider_timeout_secs(),
            primary_base_url: default_primary_base_url(),
            secondary_base_url: default_secondary_base_url(),
            default_start: default_start(),
            default_end: default_end(),
            defaults: IndicatorParams::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config from {}", path.display()))?;

        info!(path = %path.display(), symbols = ?config.symbols, "config loaded");
        Ok(config)
    }

    /// Apply environment overrides through `lookup` (normally `std::env::var`).
    ///
    /// Unparseable values are ignored with a warning.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            match port.trim().parse() {
                Ok(p) => self.port = p,
                Err(e) => warn!(value = %port, error = %e, "ignoring invalid PORT"),
            }
        }
        if let Some(host) = lookup("TA_BIND_HOST").filter(|h| !h.trim().is_empty()) {
            self.bind_host = host.trim().to_string();
        }
        if let Some(syms) = lookup("TA_SYMBOLS") {
            let parsed: Vec<String> = syms
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect();
            if !parsed.is_empty() {
                self.symbols = parsed;
            }
        }
        if let Some(secs) = lookup("TA_PROVIDER_TIMEOUT_SECS") {
            match secs.trim().parse::<u64>() {
                Ok(s) if s > 0 => self.provider_timeout_secs = s,
                _ => warn!(value = %secs, "ignoring invalid TA_PROVIDER_TIMEOUT_SECS"),
            }
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }

    /// Case-insensitive membership check against the configured tickers.
    pub fn resolve_symbol(&self, raw: &str) -> Option<&str> {
        let wanted = raw.trim();
        self.symbols
            .iter()
            .find(|s| s.eq_ignore_ascii_case(wanted))
            .map(String::as_str)
    }
}
