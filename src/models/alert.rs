use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PriceAlertKind {
    /// RSI below 30
    StrongOversold,
    /// MACD above its signal line while RSI is below 40
    BullishMacdLowRsi,
    /// Latest volume more than twice the 20-week average
    HighVolumeSpike,
}

impl std::fmt::Display for PriceAlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PriceAlertKind::StrongOversold => "Strong Oversold Signal",
            PriceAlertKind::BullishMacdLowRsi => "Bullish MACD + Low RSI",
            PriceAlertKind::HighVolumeSpike => "High Volume Spike",
        };
        f.write_str(label)
    }
}

/// Indicator condition raised on a flip match
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PriceAlert {
    pub ticker: String,
    pub kind: PriceAlertKind,
    pub current_price: f64,
    /// Human readable readings behind the alert
    pub detail: String,
}
