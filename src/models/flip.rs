use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::indicator::IndicatorSnapshot;

/// Local peak whose high beats its neighbours on both sides
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SwingHigh {
    /// Position in the source series
    pub index: usize,
    pub date: NaiveDate,
    pub price: f64,
}

/// Cluster of swing highs treated as one resistance level
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ResistanceLevel {
    /// Mean of the member swing prices
    pub representative_price: f64,
    /// Contributing swings in chronological order
    pub member_swings: Vec<SwingHigh>,
    /// Number of member swings
    pub test_count: usize,
}

impl ResistanceLevel {
    pub fn from_swings(member_swings: Vec<SwingHigh>) -> Self {
        let test_count = member_swings.len();
        let representative_price = if test_count == 0 {
            0.0
        } else {
            member_swings.iter().map(|swing| swing.price).sum::<f64>() / test_count as f64
        };

        Self {
            representative_price,
            member_swings,
            test_count,
        }
    }

    /// Latest contributing swing
    pub fn last_swing(&self) -> Option<&SwingHigh> {
        self.member_swings.last()
    }

    /// Signed distance of `price` from the level, in percent of the level
    pub fn distance_pct(&self, price: f64) -> f64 {
        (price - self.representative_price) / self.representative_price * 100.0
    }
}

/// First close decisively above a level
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BreakoutEvent {
    pub level_price: f64,
    pub index: usize,
    pub date: NaiveDate,
    pub close_price: f64,
}

/// Successful retest of a broken level from above
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FlipEvent {
    pub breakout: BreakoutEvent,
    pub retest_index: usize,
    pub retest_date: NaiveDate,
    pub retest_low: f64,
    pub retest_close: f64,
}

/// A ticker currently retesting a flipped level
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Match {
    pub ticker: String,
    pub level: ResistanceLevel,
    pub flip: FlipEvent,
    pub current_price: f64,
    /// Signed distance of the current price from the level (%)
    pub distance_pct: f64,
    /// Date of the latest bar
    pub as_of: NaiveDate,
    /// Display-only annotations, never read by detection
    pub indicator_snapshot: Option<IndicatorSnapshot>,
}
