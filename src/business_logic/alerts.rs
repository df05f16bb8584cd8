use crate::models::alert::{PriceAlert, PriceAlertKind};
use crate::models::flip::Match;

const OVERSOLD_RSI: f64 = 30.0;
const LOW_RSI: f64 = 40.0;
const VOLUME_SPIKE_RATIO: f64 = 2.0;

/// Indicator alerts for a match. Matches without a snapshot raise none.
pub fn price_alerts(found: &Match) -> Vec<PriceAlert> {
    let Some(snapshot) = found.indicator_snapshot.as_ref() else {
        return Vec::new();
    };

    let alert = |kind, detail: String| PriceAlert {
        ticker: found.ticker.clone(),
        kind,
        current_price: found.current_price,
        detail,
    };

    let mut alerts = Vec::new();
    if let Some(rsi) = snapshot.rsi {
        if rsi < OVERSOLD_RSI {
            alerts.push(alert(
                PriceAlertKind::StrongOversold,
                format!(
                    "RSI {:.1}, level ${:.2}",
                    rsi, found.level.representative_price
                ),
            ));
        }
        if rsi < LOW_RSI && snapshot.macd_trend.as_deref() == Some("Bullish") {
            alerts.push(alert(
                PriceAlertKind::BullishMacdLowRsi,
                format!("RSI {:.1}, MACD Bullish", rsi),
            ));
        }
    }

    if let Some(ratio) = snapshot.volume_ratio {
        if ratio > VOLUME_SPIKE_RATIO {
            alerts.push(alert(
                PriceAlertKind::HighVolumeSpike,
                format!("volume {:.1}x average", ratio),
            ));
        }
    }

    alerts
}
