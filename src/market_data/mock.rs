//! In-process providers for fallback and handler tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{OhlcBar, PriceProvider, ProviderError};

/// Build a flat bar (open = high = low = close) for `date` ("YYYY-MM-DD").
pub fn bar(date: &str, close: f64) -> OhlcBar {
    OhlcBar {
        date: date.parse().expect("test date"),
        open: close,
        high: close,
        low: close,
        close,
        volume: None,
    }
}

/// `n` consecutive daily bars starting 2018-01-01 with closes from `f(i)`.
pub fn daily_bars(n: usize, f: impl Fn(usize) -> f64) -> Vec<OhlcBar> {
    let start = NaiveDate::from_ymd_opt(2018, 1, 1).expect("valid date");
    (0..n)
        .map(|i| {
            let close = f(i);
            OhlcBar {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: Some(1_000.0),
            }
        })
        .collect()
}

#[derive(Clone)]
pub enum Behaviour {
    Rows(Vec<OhlcBar>),
    Fail,
    Hang,
}

/// A provider that replays a fixed behaviour and counts its invocations.
pub struct MockProvider {
    name: &'static str,
    behaviour: Behaviour,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(name: &'static str, behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            name,
            behaviour,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceProvider for MockProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch_daily(
        &self,
        symbol: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<OhlcBar>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behaviour {
            Behaviour::Rows(rows) => Ok(rows.clone()),
            Behaviour::Fail => Err(ProviderError::Malformed(format!("mock failure for {symbol}"))),
            Behaviour::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(Vec::new())
            }
        }
    }
}
