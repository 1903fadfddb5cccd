// =============================================================================
// Yahoo Finance chart API — primary daily price source
// =============================================================================
//
// GET {base}/v8/finance/chart/{SYMBOL}?period1=..&period2=..&interval=1d
//
// Prices are returned split/dividend adjusted: open, high and low are scaled
// by the same adjclose / close ratio as the close, so the candles line up
// with the adjusted close series.
// =============================================================================

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{OhlcBar, PriceProvider, ProviderError};

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

/// Yahoo Finance v8 chart API client.
#[derive(Clone)]
pub struct YahooProvider {
    client: reqwest::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Build the chart URL. `end` is inclusive, so `period2` is midnight UTC
    /// of the following day.
    fn chart_url(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc().timestamp();
        let end_ts = (end + Duration::days(1))
            .and_hms_opt(0, 0, 0)
            .unwrap_or_default()
            .and_utc()
            .timestamp();
        format!(
            "{}/v8/finance/chart/{}?period1={start_ts}&period2={end_ts}\
             &interval=1d&includeAdjustedClose=true&events=div%2Csplits",
            self.base_url,
            symbol.to_uppercase()
        )
    }
}

#[async_trait]
impl PriceProvider for YahooProvider {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    #[instrument(skip(self), name = "yahoo::fetch_daily")]
    async fn fetch_daily(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<OhlcBar>, ProviderError> {
        let url = self.chart_url(symbol, start, end);
        let resp = self.client.get(&url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status));
        }

        let body = resp.text().await?;
        let bars = parse_chart(symbol, &body)?;
        debug!(symbol, rows = bars.len(), "yahoo chart parsed");
        Ok(bars)
    }
}

/// Parse a chart API body into adjusted daily bars.
///
/// Rows without a close (holidays, halted sessions) are skipped.
fn parse_chart(symbol: &str, body: &str) -> Result<Vec<OhlcBar>, ProviderError> {
    let resp: ChartResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::Malformed(format!("chart JSON for {symbol}: {e}")))?;

    let result = match (resp.chart.result, resp.chart.error) {
        (_, Some(err)) => {
            return Err(ProviderError::Malformed(format!(
                "{}: {}",
                err.code, err.description
            )))
        }
        (Some(result), None) => result,
        (None, None) => {
            return Err(ProviderError::NoData {
                symbol: symbol.to_string(),
            })
        }
    };

    let data = result.into_iter().next().ok_or_else(|| ProviderError::NoData {
        symbol: symbol.to_string(),
    })?;

    // A valid symbol with no sessions in range comes back without timestamps.
    let timestamps = data.timestamp.unwrap_or_default();
    let gmtoffset = data.meta.map(|m| m.gmtoffset).unwrap_or(0);

    let quote = data
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Malformed("no quote block".into()))?;

    let adj_closes = data
        .indicators
        .adjclose
        .and_then(|v| v.into_iter().next())
        .map(|a| a.adjclose);

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let Some(close) = at(&quote.close, i) else {
            continue;
        };

        let date = chrono::DateTime::from_timestamp(ts + gmtoffset, 0)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| ProviderError::Malformed(format!("invalid timestamp: {ts}")))?;

        let factor = adj_closes
            .as_deref()
            .and_then(|adj| at(adj, i))
            .filter(|adj| adj.is_finite() && close != 0.0)
            .map(|adj| adj / close)
            .unwrap_or(1.0);

        let scaled = |v: Option<f64>| v.unwrap_or(close) * factor;

        bars.push(OhlcBar {
            date,
            open: scaled(at(&quote.open, i)),
            high: scaled(at(&quote.high, i)),
            low: scaled(at(&quote.low, i)),
            close: close * factor,
            volume: at(&quote.volume, i),
        });
    }

    Ok(bars)
}

fn at(col: &[Option<f64>], i: usize) -> Option<f64> {
    col.get(i).copied().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2018-01-02 and 2018-01-03 14:30 UTC (09:30 New York, gmtoffset -18000).
    const SAMPLE: &str = r#"{
        "chart": {
            "result": [{
                "meta": { "symbol": "MSFT", "gmtoffset": -18000 },
                "timestamp": [1514903400, 1514989800, 1515076200],
                "indicators": {
                    "quote": [{
                        "open":   [86.13, 86.06, null],
                        "high":   [86.31, 86.51, null],
                        "low":    [85.50, 85.97, null],
                        "close":  [85.95, 86.35, null],
                        "volume": [22483800, 26061400, null]
                    }],
                    "adjclose": [{ "adjclose": [42.975, 86.35, null] }]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn parses_and_adjusts_rows() {
        let bars = parse_chart("MSFT", SAMPLE).unwrap();
        assert_eq!(bars.len(), 2);

        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2018, 1, 2).unwrap());
        assert_eq!(bars[1].date, NaiveDate::from_ymd_opt(2018, 1, 3).unwrap());

        // First row is scaled by 0.5.
        assert!((bars[0].close - 42.975).abs() < 1e-9);
        assert!((bars[0].open - 43.065).abs() < 1e-9);
        assert!((bars[0].high - 43.155).abs() < 1e-9);
        assert!((bars[0].low - 42.75).abs() < 1e-9);
        assert_eq!(bars[0].volume, Some(22483800.0));

        // Second row is unadjusted.
        assert!((bars[1].close - 86.35).abs() < 1e-9);
        assert!((bars[1].open - 86.06).abs() < 1e-9);
    }

    #[test]
    fn error_block_is_malformed() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let err = parse_chart("ZZZZ", body).unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)));
        assert!(err.to_string().contains("Not Found"));
    }

    #[test]
    fn missing_timestamps_is_empty() {
        let body = r#"{"chart":{"result":[{"meta":{"gmtoffset":0},"indicators":{"quote":[{}],"adjclose":[{"adjclose":[]}]}}],"error":null}"#;
        assert!(parse_chart("MSFT", body).unwrap().is_empty());
    }

    #[test]
    fn garbage_body_is_malformed() {
        assert!(matches!(
            parse_chart("MSFT", "<html>blocked</html>"),
            Err(ProviderError::Malformed(_))
        ));
    }

    #[test]
    fn url_uses_inclusive_end_and_upper_case_symbol() {
        let yahoo = YahooProvider::new(reqwest::Client::new(), "https://query2.finance.yahoo.com/");
        let url = yahoo.chart_url(
            "msft",
            NaiveDate::from_ymd_opt(2018, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2018, 12, 31).unwrap(),
        );
        assert!(url.starts_with("https://query2.finance.yahoo.com/v8/finance/chart/MSFT?"));
        assert!(url.contains("period1=1514764800"));
        assert!(url.contains("period2=1546300800"));
        assert!(url.contains("interval=1d"));
    }
}
