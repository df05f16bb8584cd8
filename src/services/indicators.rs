use crate::business_logic::indicators::compute_snapshot;
use crate::models::indicator::IndicatorSnapshot;
use crate::models::price::PriceSeries;

/// Display-only annotations attached to matches
pub trait IndicatorProvider: Send + Sync {
    fn snapshot(&self, ticker: &str, series: &PriceSeries) -> Option<IndicatorSnapshot>;
}

/// Computes trend and momentum readings from the already fetched series
#[derive(Debug, Clone, Default)]
pub struct SeriesIndicators;

impl IndicatorProvider for SeriesIndicators {
    fn snapshot(&self, ticker: &str, series: &PriceSeries) -> Option<IndicatorSnapshot> {
        let snapshot = compute_snapshot(series);
        if snapshot.is_none() {
            tracing::debug!("[{}] not enough bars for indicators ({})", ticker, series.len());
        }
        snapshot
    }
}
