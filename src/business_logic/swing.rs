use crate::business_logic::config::PlateauRule;
use crate::models::flip::SwingHigh;
use crate::models::price::PriceSeries;

/// Flags bars whose high tops every neighbour within `window` bars on each side.
///
/// With `PlateauRule::FirstBar` a swing is strictly above every left neighbour and
/// not below any right neighbour, so only the first bar of an equal-high run counts.
///
/// Returns nothing when the series is shorter than `2 * window + 1`.
pub fn find_swing_highs(series: &PriceSeries, window: usize, plateau: PlateauRule) -> Vec<SwingHigh> {
    let points = series.points();
    if window == 0 || points.len() < 2 * window + 1 {
        return Vec::new();
    }

    let mut swings = Vec::new();
    for i in window..points.len() - window {
        let high = points[i].high;
        let left_clear = points[i - window..i].iter().all(|p| p.high < high);
        let right_clear = match plateau {
            PlateauRule::Strict => points[i + 1..=i + window].iter().all(|p| p.high < high),
            PlateauRule::FirstBar => points[i + 1..=i + window].iter().all(|p| p.high <= high),
        };

        if left_clear && right_clear {
            swings.push(SwingHigh {
                index: i,
                date: points[i].date,
                price: high,
            });
        }
    }

    swings
}
