use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{watch, Semaphore};
use tokio::task::{Id, JoinError, JoinSet};

use crate::business_logic::alerts::price_alerts;
use crate::business_logic::config::FlipConfig;
use crate::business_logic::scanner::{evaluate_series, TickerOutcome};
use crate::errors::ScanError;
use crate::models::scan::{ScanProgress, ScanReport};
use crate::services::indicators::IndicatorProvider;
use crate::services::market_data::MarketDataProvider;
use crate::services::universe::TickerUniverse;

/// Requests early termination of a running scan
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn same_channel(&self, other: &StopHandle) -> bool {
        Arc::ptr_eq(&self.tx, &other.tx)
    }
}

/// Receiving side of a `StopHandle`
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    /// Signal that never fires
    #[cfg(test)]
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    /// Resolves once a stop was requested
    pub async fn stopped(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                // Handle dropped without stopping
                std::future::pending::<()>().await;
            }
        }
    }
}

pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx: Arc::new(tx) }, StopSignal { rx })
}

/// Runs the flip pipeline over many tickers with bounded concurrency
#[derive(Clone)]
pub struct FlipScanner {
    provider: Arc<dyn MarketDataProvider>,
    indicators: Option<Arc<dyn IndicatorProvider>>,
    max_concurrency: usize,
}

impl FlipScanner {
    pub fn new(provider: Arc<dyn MarketDataProvider>, max_concurrency: usize) -> Self {
        Self {
            provider,
            indicators: None,
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn with_indicators(mut self, indicators: Arc<dyn IndicatorProvider>) -> Self {
        self.indicators = Some(indicators);
        self
    }

    pub fn provider(&self) -> &Arc<dyn MarketDataProvider> {
        &self.provider
    }

    /// Resolves the universe, then scans it. Universe failure aborts before any fetch.
    pub async fn run_universe_scan(
        &self,
        universe: &dyn TickerUniverse,
        lookback_years: u32,
        config: &FlipConfig,
        stop: StopSignal,
        progress: Option<&watch::Sender<ScanProgress>>,
    ) -> Result<ScanReport, ScanError> {
        let tickers = universe.get_tickers().await?;
        Ok(self
            .scan(tickers, lookback_years, config, stop, progress)
            .await)
    }

    /// Scans `tickers`, returning ranked matches and per-run counts.
    ///
    /// When `stop` fires, in-flight tickers are abandoned and whatever already
    /// finished is returned with `cancelled` set. `progress`, when given, sees
    /// done/total as each ticker completes.
    pub async fn scan(
        &self,
        tickers: Vec<String>,
        lookback_years: u32,
        config: &FlipConfig,
        mut stop: StopSignal,
        progress: Option<&watch::Sender<ScanProgress>>,
    ) -> ScanReport {
        let started = Instant::now();
        let total = tickers.len();
        tracing::info!(
            "Scanning {} tickers ({} years, {} workers)",
            total,
            lookback_years,
            self.max_concurrency
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let config = Arc::new(config.clone());
        let mut workers = JoinSet::new();
        let mut tickers_by_task = HashMap::with_capacity(total);
        for ticker in tickers {
            let semaphore = semaphore.clone();
            let provider = self.provider.clone();
            let indicators = self.indicators.clone();
            let config = config.clone();
            let worker_ticker = ticker.clone();

            let task = workers.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                evaluate_ticker(
                    provider.as_ref(),
                    indicators.as_deref(),
                    &worker_ticker,
                    lookback_years,
                    &config,
                )
                .await
            });
            tickers_by_task.insert(task.id(), ticker);
        }

        let mut tracker = ProgressTracker::start(total, progress);
        let mut report = ScanReport::default();
        loop {
            tokio::select! {
                biased;
                _ = stop.stopped() => {
                    tracing::info!("Scan stopped with {} tickers in flight", workers.len());
                    workers.abort_all();
                    report.cancelled = true;
                    break;
                }
                joined = workers.join_next() => match joined {
                    Some(result) => {
                        if collect(&mut report, result, &tickers_by_task) {
                            tracker.advance();
                        }
                    }
                    None => break,
                }
            }
        }

        // Keep tickers that finished before the abort landed
        while let Some(result) = workers.join_next().await {
            if collect(&mut report, result, &tickers_by_task) {
                tracker.advance();
            }
        }
        tracker.finish();

        report.as_of = Some(chrono::Utc::now().date_naive());
        report.rank();
        report.alerts = report.matches.iter().flat_map(price_alerts).collect();
        tracing::info!(
            "Scan finished in {:.1}s: {}/{} scanned, {} skipped, {} matches{}",
            started.elapsed().as_secs_f64(),
            report.summary.tickers_scanned,
            total,
            report.summary.tickers_skipped,
            report.summary.matches_found,
            if report.cancelled { " (stopped)" } else { "" }
        );
        report
    }
}

/// Publishes done/total as tickers finish, logging every tenth of the run
struct ProgressTracker<'a> {
    sender: Option<&'a watch::Sender<ScanProgress>>,
    done: usize,
    total: usize,
}

impl<'a> ProgressTracker<'a> {
    fn start(total: usize, sender: Option<&'a watch::Sender<ScanProgress>>) -> Self {
        let tracker = Self {
            sender,
            done: 0,
            total,
        };
        tracker.publish(true);
        tracker
    }

    fn advance(&mut self) {
        self.done += 1;
        if self.done * 10 / self.total > (self.done - 1) * 10 / self.total {
            tracing::info!("Scan progress: {}/{} tickers", self.done, self.total);
        }
        self.publish(true);
    }

    fn finish(&self) {
        self.publish(false);
    }

    fn publish(&self, running: bool) {
        if let Some(sender) = self.sender {
            sender.send_replace(ScanProgress {
                running,
                done: self.done,
                total: self.total,
            });
        }
    }
}

/// Records a finished worker, returns false for aborted ones
fn collect(
    report: &mut ScanReport,
    result: Result<TickerOutcome, JoinError>,
    tickers_by_task: &HashMap<Id, String>,
) -> bool {
    match result {
        Ok(outcome) => {
            if let TickerOutcome::NoPattern { reason, .. } = &outcome {
                tracing::debug!("[{}] no match: {}", outcome.ticker(), reason);
            }
            report.record(outcome);
            true
        }
        Err(error) if error.is_cancelled() => false,
        Err(error) => {
            let ticker = tickers_by_task
                .get(&error.id())
                .cloned()
                .unwrap_or_default();
            tracing::error!("[{}] ticker worker failed: {}", ticker, error);
            report.record(TickerOutcome::Skipped {
                reason: ScanError::WorkerFailed {
                    ticker: ticker.clone(),
                    reason: error.to_string(),
                },
                ticker,
            });
            true
        }
    }
}

/// Fetches one ticker and runs detection on it. Failures become `Skipped`.
pub async fn evaluate_ticker(
    provider: &dyn MarketDataProvider,
    indicators: Option<&dyn IndicatorProvider>,
    ticker: &str,
    lookback_years: u32,
    config: &FlipConfig,
) -> TickerOutcome {
    let series = match provider.fetch_weekly_series(ticker, lookback_years).await {
        Ok(series) => series,
        Err(reason) => {
            tracing::debug!("[{}] skipped: {}", ticker, reason);
            return TickerOutcome::Skipped {
                ticker: ticker.to_string(),
                reason,
            };
        }
    };

    match evaluate_series(&series, config) {
        TickerOutcome::Match(mut found) => {
            found.indicator_snapshot =
                indicators.and_then(|provider| provider.snapshot(ticker, &series));
            TickerOutcome::Match(found)
        }
        other => other,
    }
}
