//! Provider abstraction for daily price sources.
//!
//! Each source (Yahoo chart API, Stooq CSV) implements [`PriceProvider`] so
//! the fetcher can chain them and tests can substitute in-process mocks.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use super::OhlcBar;

/// Why a single provider attempt produced no usable rows.
///
/// None of these reach the HTTP caller; the fetcher logs them and moves on.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("no rows for {symbol}")]
    NoData { symbol: String },

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// A source of daily OHLC rows for a symbol and inclusive calendar range.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Short identifier used in logs and in the chart payload.
    fn name(&self) -> &'static str;

    /// Fetch raw rows. Ordering is not required; the fetcher normalises.
    async fn fetch_daily(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<OhlcBar>, ProviderError>;
}
