use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};

use crate::business_logic::config::FlipConfig;
use crate::errors::ScanError;
use crate::models::flip::Match;
use crate::models::scan::ScanReport;
use crate::services::scan_state::SharedScanState;
use crate::services::scanner::FlipScanner;
use crate::services::universe::TickerUniverse;

/// Periodically scans the ticker universe and publishes each report
pub struct MonitorService {
    scanner: FlipScanner,
    universe: Arc<dyn TickerUniverse>,
    config: FlipConfig,
    lookback_years: u32,
    scan_interval: Duration,
    shared_state: SharedScanState,
    previous_matches: HashSet<String>,
}

impl MonitorService {
    pub fn new(
        scanner: FlipScanner,
        universe: Arc<dyn TickerUniverse>,
        config: FlipConfig,
        lookback_years: u32,
        scan_interval: Duration,
        shared_state: SharedScanState,
    ) -> Self {
        Self {
            scanner,
            universe,
            config,
            lookback_years,
            scan_interval,
            shared_state,
            previous_matches: HashSet::new(),
        }
    }

    /// Scan immediately, then on every interval tick
    pub async fn run(&mut self) {
        let mut ticker = interval(self.scan_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = self.run_once().await {
                tracing::error!("Scheduled scan failed: {}", e);
            }
        }
    }

    /// One universe scan; a universe failure keeps the previous report
    pub async fn run_once(&mut self) -> Result<(), ScanError> {
        let (handle, signal) = self.shared_state.begin_scan().await;
        let result = self
            .scanner
            .run_universe_scan(
                self.universe.as_ref(),
                self.lookback_years,
                &self.config,
                signal,
                Some(&self.shared_state.progress),
            )
            .await;
        self.shared_state.end_scan(&handle).await;
        let report = result?;

        for found in &report.matches {
            Self::log_alert(found);
        }
        for alert in &report.alerts {
            tracing::warn!(
                "{}: {} at ${:.2} ({})",
                alert.kind,
                alert.ticker,
                alert.current_price,
                alert.detail
            );
        }
        let fresh = self.new_matches(&report);
        if fresh.is_empty() {
            tracing::info!("No new flip matches since the last scan");
        } else {
            tracing::info!("New flip matches: {}", fresh.join(", "));
        }

        if !report.cancelled {
            self.previous_matches = report.matches.iter().map(|m| m.ticker.clone()).collect();
        }
        self.shared_state.publish(report).await;
        Ok(())
    }

    /// Tickers matching now that did not match in the previous completed scan
    fn new_matches(&self, report: &ScanReport) -> Vec<String> {
        report
            .matches
            .iter()
            .filter(|found| !self.previous_matches.contains(&found.ticker))
            .map(|found| found.ticker.clone())
            .collect()
    }

    fn log_alert(found: &Match) {
        tracing::warn!(
            "FLIP: {} retesting former resistance ${:.2} ({} tests, broke out {}, held {}) - price ${:.2} ({:+.2}%)",
            found.ticker,
            found.level.representative_price,
            found.level.test_count,
            found.flip.breakout.date,
            found.flip.retest_date,
            found.current_price,
            found.distance_pct
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::business_logic::scanner::tests::flip_series;
    use crate::models::price::PriceSeries;
    use crate::models::scan::ScanProgress;
    use crate::services::market_data::MarketDataProvider;
    use crate::services::scan_state::ScanStateInner;
    use crate::services::scanner::StopSignal;
    use crate::services::universe::StaticUniverse;
    use async_trait::async_trait;

    struct FlipOnly;

    #[async_trait]
    impl MarketDataProvider for FlipOnly {
        async fn fetch_weekly_series(
            &self,
            ticker: &str,
            _lookback_years: u32,
        ) -> Result<PriceSeries, ScanError> {
            if ticker.starts_with("FLIP") {
                Ok(flip_series(ticker))
            } else {
                Err(ScanError::DataUnavailable {
                    ticker: ticker.to_string(),
                    reason: "not listed".to_string(),
                })
            }
        }
    }

    fn make_monitor(tickers: &[&str], state: SharedScanState) -> MonitorService {
        let universe = StaticUniverse::new(tickers.iter().map(|t| t.to_string()).collect());
        MonitorService::new(
            FlipScanner::new(Arc::new(FlipOnly), 2),
            Arc::new(universe),
            FlipConfig::default(),
            2,
            Duration::from_secs(60),
            state,
        )
    }

    #[tokio::test]
    async fn run_once_publishes_report() {
        let state = Arc::new(ScanStateInner::new(4));
        let mut monitor = make_monitor(&["FLIP1", "NOPE"], state.clone());

        monitor.run_once().await.unwrap();

        let latest = state.latest.read().await;
        assert_eq!(latest.summary.matches_found, 1);
        assert_eq!(latest.summary.tickers_skipped, 1);
        assert!(state.active.lock().await.is_empty());
        assert_eq!(
            *state.progress.borrow(),
            ScanProgress {
                running: false,
                done: 2,
                total: 2,
            }
        );
    }

    #[tokio::test]
    async fn new_matches_compare_with_previous_scan() {
        let state = Arc::new(ScanStateInner::new(4));
        let mut monitor = make_monitor(&["FLIP1", "FLIP2"], state.clone());
        monitor.previous_matches.insert("FLIP1".to_string());

        let report = monitor
            .scanner
            .scan(
                vec!["FLIP1".to_string(), "FLIP2".to_string()],
                2,
                &FlipConfig::default(),
                StopSignal::never(),
                None,
            )
            .await;
        assert_eq!(monitor.new_matches(&report), vec!["FLIP2"]);

        monitor.run_once().await.unwrap();
        assert_eq!(monitor.previous_matches.len(), 2);
        let latest = state.latest.read().await.clone();
        assert!(monitor.new_matches(&latest).is_empty());
    }

    #[tokio::test]
    async fn universe_failure_keeps_previous_report() {
        let state = Arc::new(ScanStateInner::new(4));
        let mut monitor = make_monitor(&[], state.clone());

        let result = monitor.run_once().await;

        assert!(matches!(result, Err(ScanError::UniverseUnavailable(_))));
        assert!(state.latest.read().await.as_of.is_none());
    }
}
