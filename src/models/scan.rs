use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::business_logic::config::{ClusterTieBreak, FlipConfig, PlateauRule};
use crate::business_logic::scanner::TickerOutcome;
use crate::models::alert::PriceAlert;
use crate::models::flip::Match;
use crate::models::series::MAX_LOOKBACK_YEARS;

pub const MAX_TICKER_LEN: usize = 12;

/// Per-run counters, merged as each ticker worker completes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ScanSummary {
    pub tickers_scanned: usize,
    pub tickers_skipped: usize,
    pub no_pattern: usize,
    pub matches_found: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SkippedTicker {
    pub ticker: String,
    pub reason: String,
}

/// Result of one scan run
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct ScanReport {
    /// Completion date of the run, absent before the first scan finishes
    pub as_of: Option<NaiveDate>,
    /// Matches ranked by absolute distance from their level
    pub matches: Vec<Match>,
    pub summary: ScanSummary,
    pub skipped: Vec<SkippedTicker>,
    /// Indicator alerts raised on the matches
    pub alerts: Vec<PriceAlert>,
    /// True when the run was stopped before every ticker finished
    pub cancelled: bool,
}

impl ScanReport {
    /// Folds one ticker outcome into the report
    pub fn record(&mut self, outcome: TickerOutcome) {
        self.summary.tickers_scanned += 1;
        match outcome {
            TickerOutcome::Match(found) => {
                self.summary.matches_found += 1;
                self.matches.push(*found);
            }
            TickerOutcome::Skipped { ticker, reason } => {
                self.summary.tickers_skipped += 1;
                self.skipped.push(SkippedTicker {
                    ticker,
                    reason: reason.to_string(),
                });
            }
            TickerOutcome::NoPattern { .. } => {
                self.summary.no_pattern += 1;
            }
        }
    }

    /// Orders matches closest-to-level first, then by ticker
    pub fn rank(&mut self) {
        self.matches.sort_by(|a, b| {
            a.distance_pct
                .abs()
                .total_cmp(&b.distance_pct.abs())
                .then_with(|| a.ticker.cmp(&b.ticker))
        });
        self.skipped.sort_by(|a, b| a.ticker.cmp(&b.ticker));
    }
}

/// Live progress of the scheduled scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ScanProgress {
    pub running: bool,
    /// Tickers finished so far
    pub done: usize,
    pub total: usize,
}

/// On-demand scan parameters; unset fields use the configured defaults
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ScanRequest {
    /// Tickers to scan. When omitted the configured universe is used.
    #[validate(length(min = 1, max = 600), custom(function = "validate_tickers"))]
    #[schema(example = json!(["AAPL", "MSFT"]))]
    pub tickers: Option<Vec<String>>,
    #[validate(range(min = 1, max = MAX_LOOKBACK_YEARS))]
    pub lookback_years: Option<u32>,
    #[validate(range(exclusive_min = 0.0, max = 50.0))]
    pub level_tolerance_pct: Option<f64>,
    #[validate(range(min = 2, max = 20))]
    pub min_tests: Option<usize>,
    #[validate(range(exclusive_min = 0.0, max = 50.0))]
    pub breakout_threshold_pct: Option<f64>,
    #[validate(range(exclusive_min = 0.0, max = 50.0))]
    pub current_test_tolerance_pct: Option<f64>,
    #[validate(range(exclusive_min = 0.0, max = 50.0))]
    pub extended_tolerance_pct: Option<f64>,
    #[validate(range(exclusive_min = 0.0, max = 50.0))]
    pub failed_flip_tolerance_pct: Option<f64>,
    #[validate(range(min = 1, max = 10))]
    pub swing_window: Option<usize>,
    pub cluster_tie_break: Option<ClusterTieBreak>,
    pub plateau_rule: Option<PlateauRule>,
}

impl ScanRequest {
    /// Overlays the request onto `defaults`
    pub fn flip_config(&self, defaults: &FlipConfig) -> FlipConfig {
        FlipConfig {
            swing_window: self.swing_window.unwrap_or(defaults.swing_window),
            level_tolerance_pct: self
                .level_tolerance_pct
                .unwrap_or(defaults.level_tolerance_pct),
            min_tests: self.min_tests.unwrap_or(defaults.min_tests),
            breakout_threshold_pct: self
                .breakout_threshold_pct
                .unwrap_or(defaults.breakout_threshold_pct),
            current_test_tolerance_pct: self
                .current_test_tolerance_pct
                .unwrap_or(defaults.current_test_tolerance_pct),
            extended_tolerance_pct: self
                .extended_tolerance_pct
                .unwrap_or(defaults.extended_tolerance_pct),
            failed_flip_tolerance_pct: self
                .failed_flip_tolerance_pct
                .or(defaults.failed_flip_tolerance_pct),
            cluster_tie_break: self.cluster_tie_break.unwrap_or(defaults.cluster_tie_break),
            plateau_rule: self.plateau_rule.unwrap_or(defaults.plateau_rule),
        }
    }
}

pub fn validate_tickers(tickers: &[String]) -> Result<(), ValidationError> {
    let valid = tickers
        .iter()
        .all(|ticker| !ticker.trim().is_empty() && ticker.len() <= MAX_TICKER_LEN);
    if valid {
        return Ok(());
    }

    let mut error = ValidationError::new("invalid_ticker");
    error.message = Some(
        format!("tickers must be non-empty and at most {MAX_TICKER_LEN} characters").into(),
    );
    Err(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::business_logic::scanner::NoPatternReason;
    use crate::errors::ScanError;

    #[test]
    fn scan_request_bounds() {
        let mut request = ScanRequest {
            tickers: Some(vec![]),
            ..ScanRequest::default()
        };
        assert!(request.validate().is_err());

        request.tickers = Some(vec!["AAPL".to_string(), " ".to_string()]);
        assert!(request.validate().is_err());

        request.tickers = Some(vec!["AAPL".to_string()]);
        request.level_tolerance_pct = Some(0.0);
        assert!(request.validate().is_err());

        request.level_tolerance_pct = Some(1.5);
        request.min_tests = Some(1);
        assert!(request.validate().is_err());

        request.min_tests = Some(4);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn flip_config_keeps_defaults_for_unset_fields() {
        let request = ScanRequest {
            min_tests: Some(4),
            level_tolerance_pct: Some(1.0),
            ..ScanRequest::default()
        };
        let defaults = FlipConfig::default();
        let config = request.flip_config(&defaults);

        assert_eq!(config.min_tests, 4);
        assert_eq!(config.level_tolerance_pct, 1.0);
        assert_eq!(config.swing_window, defaults.swing_window);
        assert_eq!(config.extended_tolerance_pct, defaults.extended_tolerance_pct);
        assert_eq!(config.plateau_rule, PlateauRule::FirstBar);
    }

    #[test]
    fn scan_request_parses_rule_names() {
        let request: ScanRequest = serde_json::from_str(
            r#"{"tickers":["AAPL"],"plateau_rule":"strict","cluster_tie_break":"newest_level"}"#,
        )
        .unwrap();
        let config = request.flip_config(&FlipConfig::default());

        assert_eq!(config.plateau_rule, PlateauRule::Strict);
        assert_eq!(config.cluster_tie_break, ClusterTieBreak::NewestLevel);
    }

    #[test]
    fn record_updates_counters() {
        let mut report = ScanReport::default();
        report.record(TickerOutcome::Skipped {
            ticker: "ZZZ".to_string(),
            reason: ScanError::DataUnavailable {
                ticker: "ZZZ".to_string(),
                reason: "no bars".to_string(),
            },
        });
        report.record(TickerOutcome::NoPattern {
            ticker: "AAA".to_string(),
            reason: NoPatternReason::NoBreakout,
        });

        assert_eq!(report.summary.tickers_scanned, 2);
        assert_eq!(report.summary.tickers_skipped, 1);
        assert_eq!(report.summary.no_pattern, 1);
        assert_eq!(report.summary.matches_found, 0);
        assert_eq!(report.skipped[0].ticker, "ZZZ");
    }
}
