// =============================================================================
// Market Data Fetcher — primary provider with a single fallback
// =============================================================================
//
// fetch(symbol, start, end):
//   1. primary   — any error, timeout or empty result falls through
//   2. secondary — same rules
//   3. empty series
//
// No provider is retried and nothing is cached: every call hits the network.
// Errors are logged here and never returned; an empty series is the only
// failure signal the caller sees.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};

use super::{OhlcSeries, PriceProvider, ProviderError};

/// Chains a primary and a secondary [`PriceProvider`].
#[derive(Clone)]
pub struct MarketDataFetcher {
    primary: Arc<dyn PriceProvider>,
    secondary: Arc<dyn PriceProvider>,
    attempt_timeout: Duration,
}

impl MarketDataFetcher {
    /// `attempt_timeout` bounds each provider call separately.
    pub fn new(
        primary: Arc<dyn PriceProvider>,
        secondary: Arc<dyn PriceProvider>,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            primary,
            secondary,
            attempt_timeout,
        }
    }

    /// Fetch daily bars for `symbol` over the inclusive `[start, end]` range.
    ///
    /// Always returns; an empty series means neither provider had usable rows.
    #[instrument(skip(self), name = "fetcher::fetch")]
    pub async fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> OhlcSeries {
        if start > end {
            debug!(%start, %end, "inverted date range — nothing to fetch");
            return OhlcSeries::empty();
        }

        for provider in [&self.primary, &self.secondary] {
            match self.attempt(provider.as_ref(), symbol, start, end).await {
                Ok(series) => {
                    info!(
                        symbol,
                        provider = provider.name(),
                        rows = series.len(),
                        "price series fetched"
                    );
                    return series;
                }
                Err(e) => {
                    warn!(symbol, provider = provider.name(), error = %e, "provider failed — falling through");
                }
            }
        }

        warn!(symbol, %start, %end, "all providers failed — returning empty series");
        OhlcSeries::empty()
    }

    async fn attempt(
        &self,
        provider: &dyn PriceProvider,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<OhlcSeries, ProviderError> {
        let rows = tokio::time::timeout(self.attempt_timeout, provider.fetch_daily(symbol, start, end))
            .await
            .map_err(|_| ProviderError::Timeout(self.attempt_timeout))??;

        let series = OhlcSeries::from_rows(rows, provider.name());
        if series.is_empty() {
            return Err(ProviderError::NoData {
                symbol: symbol.to_string(),
            });
        }
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::mock::{bar, Behaviour, MockProvider};

    fn range() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2018, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2018, 12, 31).unwrap(),
        )
    }

    fn fetcher(primary: Arc<MockProvider>, secondary: Arc<MockProvider>) -> MarketDataFetcher {
        MarketDataFetcher::new(primary, secondary, Duration::from_millis(200))
    }

    fn unsorted_rows() -> Vec<crate::market_data::OhlcBar> {
        vec![
            bar("2018-01-04", 4.0),
            bar("2018-01-02", 2.0),
            bar("2018-01-03", 3.0),
        ]
    }

    #[tokio::test]
    async fn primary_success_never_touches_secondary() {
        let primary = MockProvider::new("primary", Behaviour::Rows(unsorted_rows()));
        let secondary = MockProvider::new("secondary", Behaviour::Rows(unsorted_rows()));
        let (start, end) = range();

        let series = fetcher(primary.clone(), secondary.clone())
            .fetch("MSFT", start, end)
            .await;

        assert_eq!(series.len(), 3);
        assert_eq!(series.source(), Some("primary"));
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 0);
    }

    #[tokio::test]
    async fn primary_failure_falls_back_to_sorted_secondary() {
        let primary = MockProvider::new("primary", Behaviour::Fail);
        let secondary = MockProvider::new("secondary", Behaviour::Rows(unsorted_rows()));
        let (start, end) = range();

        let series = fetcher(primary.clone(), secondary.clone())
            .fetch("MSFT", start, end)
            .await;

        assert_eq!(series.source(), Some("secondary"));
        assert_eq!(series.closes(), vec![2.0, 3.0, 4.0]);
        assert!(series.dates().windows(2).all(|w| w[0] < w[1]));
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 1);
    }

    #[tokio::test]
    async fn primary_empty_falls_back() {
        let primary = MockProvider::new("primary", Behaviour::Rows(Vec::new()));
        let secondary = MockProvider::new("secondary", Behaviour::Rows(unsorted_rows()));
        let (start, end) = range();

        let series = fetcher(primary, secondary.clone()).fetch("MSFT", start, end).await;

        assert_eq!(series.source(), Some("secondary"));
        assert_eq!(secondary.calls(), 1);
    }

    #[tokio::test]
    async fn primary_timeout_falls_back() {
        let primary = MockProvider::new("primary", Behaviour::Hang);
        let secondary = MockProvider::new("secondary", Behaviour::Rows(unsorted_rows()));
        let (start, end) = range();

        let series = fetcher(primary, secondary).fetch("MSFT", start, end).await;

        assert_eq!(series.source(), Some("secondary"));
    }

    #[tokio::test]
    async fn both_failing_is_empty_not_error() {
        let primary = MockProvider::new("primary", Behaviour::Fail);
        let secondary = MockProvider::new("secondary", Behaviour::Rows(Vec::new()));
        let (start, end) = range();

        let series = fetcher(primary.clone(), secondary.clone())
            .fetch("MSFT", start, end)
            .await;

        assert!(series.is_empty());
        assert!(series.source().is_none());
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 1);
    }

    #[tokio::test]
    async fn inverted_range_skips_the_network() {
        let primary = MockProvider::new("primary", Behaviour::Rows(unsorted_rows()));
        let secondary = MockProvider::new("secondary", Behaviour::Rows(unsorted_rows()));
        let (start, end) = range();

        let series = fetcher(primary.clone(), secondary).fetch("MSFT", end, start).await;

        assert!(series.is_empty());
        assert_eq!(primary.calls(), 0);
    }
}
