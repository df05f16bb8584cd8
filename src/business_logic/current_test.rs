use crate::models::flip::ResistanceLevel;

/// Whether the latest price is retesting a flipped level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentTest {
    pub testing: bool,
    /// Signed % distance from the level
    pub distance_pct: f64,
}

/// Tight band on both sides of the level, looser band above it for an early bounce.
pub fn is_testing_now(
    current_price: f64,
    level: &ResistanceLevel,
    base_tolerance_pct: f64,
    extended_tolerance_pct: f64,
) -> CurrentTest {
    let distance_pct = level.distance_pct(current_price);
    let within_base = distance_pct.abs() <= base_tolerance_pct;
    let bouncing = distance_pct > 0.0 && distance_pct <= extended_tolerance_pct;

    CurrentTest {
        testing: within_base || bouncing,
        distance_pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::flip::SwingHigh;
    use chrono::NaiveDate;

    fn level_at(price: f64) -> ResistanceLevel {
        ResistanceLevel::from_swings(vec![SwingHigh {
            index: 0,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            price,
        }])
    }

    #[test]
    fn test_at_level_is_testing() {
        let result = is_testing_now(100.0, &level_at(100.0), 2.0, 5.0);
        assert!(result.testing);
        assert_eq!(result.distance_pct, 0.0);
    }

    #[test]
    fn test_bounce_band_above_level() {
        let level = level_at(100.0);

        let inside = is_testing_now(104.5, &level, 2.0, 5.0);
        assert!(inside.testing);
        assert!((inside.distance_pct - 4.5).abs() < 1e-9);

        assert!(!is_testing_now(105.01, &level, 2.0, 5.0).testing);
    }

    #[test]
    fn test_below_level_uses_base_band_only() {
        let level = level_at(100.0);

        let inside = is_testing_now(98.5, &level, 2.0, 5.0);
        assert!(inside.testing);
        assert!(inside.distance_pct < 0.0);

        assert!(!is_testing_now(97.99, &level, 2.0, 5.0).testing);
    }
}
