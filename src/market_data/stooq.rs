// =============================================================================
// Stooq CSV download — secondary daily price source
// =============================================================================
//
// GET {base}/q/d/l/?s={symbol}.us&d1=YYYYMMDD&d2=YYYYMMDD&i=d
//
// Body is `Date,Open,High,Low,Close,Volume` with ISO dates.  An unknown
// symbol or an empty range comes back as the literal text "No data".
// =============================================================================

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, instrument};

use super::{OhlcBar, PriceProvider, ProviderError};

/// Stooq daily CSV client for US listings.
#[derive(Clone)]
pub struct StooqProvider {
    client: reqwest::Client,
    base_url: String,
}

impl StooqProvider {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn csv_url(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        format!(
            "{}/q/d/l/?s={}.us&d1={}&d2={}&i=d",
            self.base_url,
            symbol.to_lowercase(),
            start.format("%Y%m%d"),
            end.format("%Y%m%d"),
        )
    }
}

#[async_trait]
impl PriceProvider for StooqProvider {
    fn name(&self) -> &'static str {
        "stooq"
    }

    #[instrument(skip(self), name = "stooq::fetch_daily")]
    async fn fetch_daily(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<OhlcBar>, ProviderError> {
        let url = self.csv_url(symbol, start, end);
        let resp = self.client.get(&url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status));
        }

        let body = resp.text().await?;
        let bars = parse_csv(symbol, &body)?;
        debug!(symbol, rows = bars.len(), "stooq csv parsed");
        Ok(bars)
    }
}

/// Column positions resolved from the header row.
struct Columns {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

impl Columns {
    /// `Date` must match exactly; price columns are matched case-insensitively.
    fn resolve(headers: &csv::StringRecord) -> Result<Self, ProviderError> {
        let find = |name: &str| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name));
        let require = |name: &str| {
            find(name).ok_or_else(|| ProviderError::Malformed(format!("missing '{name}' column")))
        };

        Ok(Self {
            date: headers
                .iter()
                .position(|h| h.trim() == "Date")
                .ok_or_else(|| ProviderError::Malformed("missing 'Date' column".into()))?,
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close: require("close")?,
            volume: find("volume"),
        })
    }
}

/// Parse the CSV body into bars in file order.
///
/// Rows whose close does not parse are skipped; an unparseable date fails the
/// whole response, since the date is the ordering key.
fn parse_csv(symbol: &str, body: &str) -> Result<Vec<OhlcBar>, ProviderError> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("no data") {
        return Err(ProviderError::NoData {
            symbol: symbol.to_string(),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(trimmed.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| ProviderError::Malformed(format!("csv header: {e}")))?
        .clone();
    let cols = Columns::resolve(&headers)?;

    let mut bars = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ProviderError::Malformed(format!("csv row: {e}")))?;
        let field = |i: usize| record.get(i).unwrap_or("");
        let number = |i: usize| field(i).parse::<f64>().ok();

        let date = NaiveDate::parse_from_str(field(cols.date), "%Y-%m-%d").map_err(|e| {
            ProviderError::Malformed(format!("bad date '{}': {e}", field(cols.date)))
        })?;

        let Some(close) = number(cols.close) else {
            continue;
        };

        bars.push(OhlcBar {
            date,
            open: number(cols.open).unwrap_or(close),
            high: number(cols.high).unwrap_or(close),
            low: number(cols.low).unwrap_or(close),
            close,
            volume: cols.volume.and_then(number),
        });
    }

    Ok(bars)
}
