use crate::models::flip::{BreakoutEvent, FlipEvent, ResistanceLevel};
use crate::models::price::PriceSeries;

/// Confirms a broken level was retested and held as support.
///
/// The retest is the first bar after the breakout whose low reaches within
/// `tolerance_pct` of the level while it closes at or above the level. Any close
/// more than `fail_tolerance_pct` below the level, before or after the retest,
/// fails the flip. A series that ends before a retest is not a flip.
pub fn verify_flip(
    series: &PriceSeries,
    breakout: &BreakoutEvent,
    level: &ResistanceLevel,
    tolerance_pct: f64,
    fail_tolerance_pct: f64,
) -> Option<FlipEvent> {
    let level_price = level.representative_price;
    let touch_ceiling = level_price * (1.0 + tolerance_pct / 100.0);
    let fail_floor = level_price * (1.0 - fail_tolerance_pct / 100.0);
    let after_breakout = series.points().iter().enumerate().skip(breakout.index + 1);

    let mut retest = None;
    for (index, point) in after_breakout {
        if point.close < fail_floor {
            tracing::debug!(
                "[{}] flip of {:.2} failed: close {:.2} on {}",
                series.ticker,
                level_price,
                point.close,
                point.date
            );
            return None;
        }

        if retest.is_none() && point.low <= touch_ceiling && point.close >= level_price {
            retest = Some(FlipEvent {
                breakout: breakout.clone(),
                retest_index: index,
                retest_date: point.date,
                retest_low: point.low,
                retest_close: point.close,
            });
        }
    }

    retest
}
