use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::price::PricePoint;

pub const MAX_LOOKBACK_YEARS: u32 = 10;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema, IntoParams)]
pub struct SeriesQuery {
    #[validate(length(min = 1, max = 12))]
    #[param(example = "AAPL")]
    pub ticker: String,
    /// Years of weekly history to return
    #[serde(default = "default_lookback_years")]
    #[validate(range(min = 1, max = MAX_LOOKBACK_YEARS))]
    #[param(example = 2, default = 2)]
    pub lookback_years: u32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SeriesSnapshot {
    pub as_of_ms: u64,
    pub ticker: String,
    pub lookback_years: u32,
    pub points: Vec<PricePoint>,
}

fn default_lookback_years() -> u32 {
    2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_query_requires_ticker_and_lookback_bounds() {
        let mut query = SeriesQuery {
            ticker: "".to_string(),
            lookback_years: 0,
        };
        assert!(query.validate().is_err());

        query.ticker = "MSFT".to_string();
        query.lookback_years = MAX_LOOKBACK_YEARS + 1;
        assert!(query.validate().is_err());

        query.lookback_years = MAX_LOOKBACK_YEARS;
        assert!(query.validate().is_ok());
    }
}
