use async_trait::async_trait;

use crate::errors::ScanError;
use crate::models::price::PriceSeries;

/// Source of weekly bars for a ticker
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Weekly bars covering the last `lookback_years`.
    ///
    /// Fails with `ScanError::DataUnavailable` when the ticker cannot be
    /// resolved or no bars come back.
    async fn fetch_weekly_series(
        &self,
        ticker: &str,
        lookback_years: u32,
    ) -> Result<PriceSeries, ScanError>;
}
