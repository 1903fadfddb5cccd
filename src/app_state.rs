// =============================================================================
// Application Context — built once in `main`, shared with every handler
// =============================================================================
//
// Holds only immutable data: the loaded configuration, the fetcher (which
// owns the shared reqwest connection pool) and the start instant.  Requests
// never mutate it, so handlers receive it as `Arc<AppContext>` with no locks.
// =============================================================================

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::debug;

use crate::market_data::{MarketDataFetcher, PriceProvider, StooqProvider, YahooProvider};
use crate::runtime_config::RuntimeConfig;

/// Browser-like agent; both providers reject obviously scripted clients.
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko)";

pub struct AppContext {
    pub config: RuntimeConfig,
    pub fetcher: MarketDataFetcher,
    /// Instant when the service was started. Used for uptime reporting.
    pub start_time: Instant,
}

impl AppContext {
    /// Construct the production context: Yahoo as primary, Stooq as fallback,
    /// both sharing one HTTP client.
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.provider_timeout_secs);
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        let primary = Arc::new(YahooProvider::new(client.clone(), &config.primary_base_url));
        let secondary = Arc::new(StooqProvider::new(client, &config.secondary_base_url));

        debug!(
            primary = %config.primary_base_url,
            secondary = %config.secondary_base_url,
            timeout_secs = config.provider_timeout_secs,
            "providers initialised"
        );

        Ok(Self::with_providers(config, primary, secondary))
    }

    /// Construct a context around arbitrary providers.
    pub fn with_providers(
        config: RuntimeConfig,
        primary: Arc<dyn PriceProvider>,
        secondary: Arc<dyn PriceProvider>,
    ) -> Self {
        let timeout = Duration::from_secs(config.provider_timeout_secs);
        Self {
            fetcher: MarketDataFetcher::new(primary, secondary, timeout),
            config,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
