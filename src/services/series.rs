use std::sync::Arc;

use crate::errors::ScanError;
use crate::models::series::SeriesSnapshot;
use crate::services::market_data::MarketDataProvider;

/// Weekly bars for charting a single ticker
pub struct SeriesService {
    provider: Arc<dyn MarketDataProvider>,
}

impl SeriesService {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { provider }
    }

    pub async fn fetch_snapshot(
        &self,
        ticker: &str,
        lookback_years: u32,
    ) -> Result<SeriesSnapshot, ScanError> {
        let ticker = normalize_ticker(ticker);
        let series = self
            .provider
            .fetch_weekly_series(&ticker, lookback_years)
            .await?;

        Ok(SeriesSnapshot {
            as_of_ms: chrono::Utc::now().timestamp_millis() as u64,
            ticker,
            lookback_years,
            points: series.points().to_vec(),
        })
    }
}

fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::business_logic::scanner::tests::flip_series;
    use crate::models::price::PriceSeries;
    use async_trait::async_trait;

    struct OneTicker;

    #[async_trait]
    impl MarketDataProvider for OneTicker {
        async fn fetch_weekly_series(
            &self,
            ticker: &str,
            _lookback_years: u32,
        ) -> Result<PriceSeries, ScanError> {
            if ticker == "AAPL" {
                Ok(flip_series(ticker))
            } else {
                Err(ScanError::DataUnavailable {
                    ticker: ticker.to_string(),
                    reason: "unknown".to_string(),
                })
            }
        }
    }

    #[test]
    fn normalize_ticker_trims_and_uppercases() {
        assert_eq!(normalize_ticker(" aapl "), "AAPL");
    }

    #[tokio::test]
    async fn fetch_snapshot_returns_points() {
        let service = SeriesService::new(Arc::new(OneTicker));
        let snapshot = service.fetch_snapshot("aapl", 2).await.unwrap();

        assert_eq!(snapshot.ticker, "AAPL");
        assert_eq!(snapshot.points.len(), 120);
    }

    #[tokio::test]
    async fn fetch_snapshot_passes_through_unavailable() {
        let service = SeriesService::new(Arc::new(OneTicker));

        assert!(matches!(
            service.fetch_snapshot("ZZZZ", 2).await,
            Err(ScanError::DataUnavailable { .. })
        ));
    }
}
