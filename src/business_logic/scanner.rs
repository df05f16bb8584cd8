use std::fmt;

use crate::business_logic::breakout::find_breakout;
use crate::business_logic::config::FlipConfig;
use crate::business_logic::current_test::is_testing_now;
use crate::business_logic::flip::verify_flip;
use crate::business_logic::levels::cluster_levels;
use crate::business_logic::swing::find_swing_highs;
use crate::errors::ScanError;
use crate::models::flip::{Match, ResistanceLevel};
use crate::models::price::PriceSeries;

/// Why a ticker produced no match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoPatternReason {
    NoQualifyingLevel,
    NoBreakout,
    NoConfirmedFlip,
    NotTestingNow,
}

impl fmt::Display for NoPatternReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            NoPatternReason::NoQualifyingLevel => "no qualifying resistance level",
            NoPatternReason::NoBreakout => "no breakout above a level",
            NoPatternReason::NoConfirmedFlip => "no confirmed flip",
            NoPatternReason::NotTestingNow => "flipped level not under test",
        };
        f.write_str(text)
    }
}

/// Result of running the detection pipeline for one ticker
#[derive(Debug, Clone)]
pub enum TickerOutcome {
    Match(Box<Match>),
    Skipped { ticker: String, reason: ScanError },
    NoPattern { ticker: String, reason: NoPatternReason },
}

impl TickerOutcome {
    pub fn ticker(&self) -> &str {
        match self {
            TickerOutcome::Match(found) => &found.ticker,
            TickerOutcome::Skipped { ticker, .. } | TickerOutcome::NoPattern { ticker, .. } => {
                ticker
            }
        }
    }
}

/// Runs swing, level, breakout, flip and current-test detection over one series.
///
/// Levels are tried by breakout recency; the first whose flip is confirmed and
/// currently under test becomes the match. The returned match carries no
/// indicator snapshot.
pub fn evaluate_series(series: &PriceSeries, config: &FlipConfig) -> TickerOutcome {
    let ticker = series.ticker.clone();
    let required = config.min_bars();
    let current = match series.last() {
        Some(point) if series.len() >= required => point,
        _ => {
            return TickerOutcome::Skipped {
                reason: ScanError::InsufficientHistory {
                    ticker: ticker.clone(),
                    bars: series.len(),
                    required,
                },
                ticker,
            }
        }
    };

    let swings = find_swing_highs(series, config.swing_window, config.plateau_rule);
    let levels = cluster_levels(
        &swings,
        config.level_tolerance_pct,
        config.min_tests,
        config.cluster_tie_break,
    );
    tracing::debug!(
        "[{}] {} swing highs, {} levels with >= {} tests",
        ticker,
        swings.len(),
        levels.len(),
        config.min_tests
    );
    if levels.is_empty() {
        return TickerOutcome::NoPattern {
            ticker,
            reason: NoPatternReason::NoQualifyingLevel,
        };
    }

    let mut broken: Vec<_> = levels
        .iter()
        .filter_map(|level| {
            find_breakout(series, level, config.breakout_threshold_pct)
                .map(|breakout| (level, breakout))
        })
        .collect();
    if broken.is_empty() {
        return TickerOutcome::NoPattern {
            ticker,
            reason: NoPatternReason::NoBreakout,
        };
    }
    broken.sort_by(|(level_a, breakout_a), (level_b, breakout_b)| {
        let last_test = |level: &ResistanceLevel| level.last_swing().map(|swing| swing.index);
        breakout_b
            .index
            .cmp(&breakout_a.index)
            .then_with(|| last_test(*level_b).cmp(&last_test(*level_a)))
    });

    let mut any_flip = false;
    for (level, breakout) in broken {
        let Some(flip) = verify_flip(
            series,
            &breakout,
            level,
            config.level_tolerance_pct,
            config.failed_flip_tolerance(),
        ) else {
            continue;
        };
        any_flip = true;

        let current_test = is_testing_now(
            current.close,
            level,
            config.current_test_tolerance_pct,
            config.extended_tolerance_pct,
        );
        tracing::debug!(
            "[{}] level {:.2} flipped on {}, price {:.2} is {:+.2}% away",
            ticker,
            level.representative_price,
            flip.retest_date,
            current.close,
            current_test.distance_pct
        );
        if current_test.testing {
            return TickerOutcome::Match(Box::new(Match {
                ticker,
                level: level.clone(),
                flip,
                current_price: current.close,
                distance_pct: current_test.distance_pct,
                as_of: current.date,
                indicator_snapshot: None,
            }));
        }
    }

    let reason = if any_flip {
        NoPatternReason::NotTestingNow
    } else {
        NoPatternReason::NoConfirmedFlip
    };
    TickerOutcome::NoPattern { ticker, reason }
}
