use crate::models::flip::{BreakoutEvent, ResistanceLevel};
use crate::models::price::PriceSeries;

/// First close more than `breakout_threshold_pct` above the level, after its last swing.
///
/// Uses closes, not highs, so a wick through the level does not count.
pub fn find_breakout(
    series: &PriceSeries,
    level: &ResistanceLevel,
    breakout_threshold_pct: f64,
) -> Option<BreakoutEvent> {
    let last_swing = level.last_swing()?;
    let trigger = level.representative_price * (1.0 + breakout_threshold_pct / 100.0);

    series
        .points()
        .iter()
        .enumerate()
        .skip(last_swing.index + 1)
        .find(|(_, point)| point.close > trigger)
        .map(|(index, point)| BreakoutEvent {
            level_price: level.representative_price,
            index,
            date: point.date,
            close_price: point.close,
        })
}
