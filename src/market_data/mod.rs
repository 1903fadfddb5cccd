pub mod fetcher;
pub mod provider;
pub mod stooq;
pub mod yahoo;

#[cfg(test)]
pub mod mock;

pub use fetcher::MarketDataFetcher;
pub use provider::{PriceProvider, ProviderError};
pub use stooq::StooqProvider;
pub use yahoo::YahooProvider;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A single daily OHLC record in the canonical schema every provider maps to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

/// Daily bars with strictly ascending, unique dates.
///
/// The only way to build one is [`OhlcSeries::from_rows`], which enforces the
/// ordering, so downstream indicator code can index closes by position.
#[derive(Debug, Clone, Default)]
pub struct OhlcSeries {
    bars: Vec<OhlcBar>,
    source: Option<&'static str>,
}

impl OhlcSeries {
    /// The well-defined "no data" result.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Normalise raw provider rows: drop rows without a finite close, sort by
    /// date and keep the last row seen for any duplicated date.
    pub fn from_rows(mut rows: Vec<OhlcBar>, source: &'static str) -> Self {
        rows.retain(|b| b.close.is_finite());
        // Stable sort keeps provider order within a date, so the dedup below
        // retains the row the provider emitted last.
        rows.sort_by_key(|b| b.date);
        let mut bars: Vec<OhlcBar> = Vec::with_capacity(rows.len());
        for bar in rows {
            match bars.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => bars.push(bar),
            }
        }
        Self {
            bars,
            source: Some(source),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn bars(&self) -> &[OhlcBar] {
        &self.bars
    }

    /// Name of the provider that produced the rows, `None` for an empty result.
    pub fn source(&self) -> Option<&'static str> {
        if self.bars.is_empty() {
            None
        } else {
            self.source
        }
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::mock::bar;

    #[test]
    fn rows_are_sorted_ascending() {
        let series = OhlcSeries::from_rows(
            vec![bar("2018-01-03", 3.0), bar("2018-01-01", 1.0), bar("2018-01-02", 2.0)],
            "test",
        );
        assert_eq!(series.closes(), vec![1.0, 2.0, 3.0]);
        assert!(series.dates().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn duplicate_dates_keep_last_row() {
        let series = OhlcSeries::from_rows(
            vec![bar("2018-01-02", 2.0), bar("2018-01-01", 1.0), bar("2018-01-02", 5.0)],
            "test",
        );
        assert_eq!(series.len(), 2);
        assert_eq!(series.closes(), vec![1.0, 5.0]);
    }

    #[test]
    fn non_finite_closes_are_dropped() {
        let series = OhlcSeries::from_rows(
            vec![bar("2018-01-01", f64::NAN), bar("2018-01-02", 2.0)],
            "test",
        );
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn empty_series_has_no_source() {
        assert!(OhlcSeries::empty().source().is_none());
        assert!(OhlcSeries::from_rows(Vec::new(), "test").source().is_none());
        assert_eq!(
            OhlcSeries::from_rows(vec![bar("2018-01-01", 1.0)], "test").source(),
            Some("test")
        );
    }
}
