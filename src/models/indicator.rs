use serde::Serialize;
use utoipa::ToSchema;

/// Trend and momentum readings attached to a match for display
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct IndicatorSnapshot {
    pub rsi: Option<f64>,
    pub rsi_signal: Option<String>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub macd_trend: Option<String>,
    pub ma_50: Option<f64>,
    pub ma_200: Option<f64>,
    pub above_ma50: Option<bool>,
    pub above_ma200: Option<bool>,
    pub atr: Option<f64>,
    pub current_volume: f64,
    pub avg_volume_20: Option<f64>,
    pub volume_ratio: Option<f64>,
}
