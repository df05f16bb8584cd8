use crate::models::indicator::IndicatorSnapshot;
use crate::models::price::{PricePoint, PriceSeries};

/// Bars needed before a snapshot is produced
pub const MIN_SNAPSHOT_BARS: usize = 50;

const RSI_PERIOD: usize = 14;
const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;
const ATR_PERIOD: usize = 14;
const VOLUME_WINDOW: usize = 20;

/// Average True Range (ATR) calculator, Wilder smoothing
#[derive(Debug, Clone)]
pub struct AtrCalculator {
    period: usize,
    seed: Vec<f64>,
    atr: Option<f64>,
    prev_close: Option<f64>,
}

impl AtrCalculator {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            seed: Vec::with_capacity(period),
            atr: None,
            prev_close: None,
        }
    }

    fn true_range(&self, point: &PricePoint) -> f64 {
        let hl = point.high - point.low;
        match self.prev_close {
            Some(pc) => hl.max((point.high - pc).abs()).max((point.low - pc).abs()),
            None => hl,
        }
    }

    /// Update ATR with a new bar, returns current ATR once `period` bars were seen
    pub fn update(&mut self, point: &PricePoint) -> Option<f64> {
        let tr = self.true_range(point);
        self.prev_close = Some(point.close);

        self.atr = match self.atr {
            Some(prev) => Some((prev * (self.period - 1) as f64 + tr) / self.period as f64),
            None => {
                self.seed.push(tr);
                if self.seed.len() == self.period {
                    Some(self.seed.iter().sum::<f64>() / self.period as f64)
                } else {
                    None
                }
            }
        };
        self.atr
    }
}

/// Exponential moving average seeded with the first value
#[derive(Debug, Clone)]
pub struct Ema {
    alpha: f64,
    value: Option<f64>,
}

impl Ema {
    pub fn new(span: usize) -> Self {
        Self {
            alpha: 2.0 / (span as f64 + 1.0),
            value: None,
        }
    }

    pub fn update(&mut self, x: f64) -> f64 {
        let next = match self.value {
            Some(prev) => self.alpha * x + (1.0 - self.alpha) * prev,
            None => x,
        };
        self.value = Some(next);
        next
    }
}

/// Mean of the last `period` values
pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let window = &values[values.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// RSI over the last `period` changes, simple-average gains and losses
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }
    let window = &closes[closes.len() - period - 1..];
    let (gain, loss) = window
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .fold((0.0, 0.0), |(gain, loss), delta| {
            if delta > 0.0 {
                (gain + delta, loss)
            } else {
                (gain, loss - delta)
            }
        });

    if loss == 0.0 {
        return Some(if gain == 0.0 { 50.0 } else { 100.0 });
    }
    let rs = gain / loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

/// Latest MACD line, signal line and histogram
pub fn macd(closes: &[f64]) -> Option<(f64, f64, f64)> {
    if closes.is_empty() {
        return None;
    }
    let mut fast = Ema::new(MACD_FAST);
    let mut slow = Ema::new(MACD_SLOW);
    let mut signal = Ema::new(MACD_SIGNAL);

    let mut last = None;
    for &close in closes {
        let line = fast.update(close) - slow.update(close);
        let signal_value = signal.update(line);
        last = Some((line, signal_value, line - signal_value));
    }
    last
}

fn rsi_signal(value: f64) -> &'static str {
    if value < 30.0 {
        "Oversold"
    } else if value > 70.0 {
        "Overbought"
    } else {
        "Neutral"
    }
}

/// Trend and momentum readings for the latest bar of `series`
pub fn compute_snapshot(series: &PriceSeries) -> Option<IndicatorSnapshot> {
    if series.len() < MIN_SNAPSHOT_BARS {
        return None;
    }
    let closes = series.closes();
    let latest = series.last()?;

    let rsi_value = rsi(&closes, RSI_PERIOD);
    let macd_values = macd(&closes);
    let ma_50 = sma(&closes, 50);
    let ma_200 = sma(&closes, 200);

    let mut atr = AtrCalculator::new(ATR_PERIOD);
    let atr_value = series.points().iter().fold(None, |_, point| atr.update(point));

    let volumes: Vec<f64> = series.points().iter().map(|point| point.volume).collect();
    let avg_volume_20 = sma(&volumes, VOLUME_WINDOW);
    let volume_ratio = avg_volume_20
        .filter(|avg| *avg > 0.0)
        .map(|avg| latest.volume / avg);

    Some(IndicatorSnapshot {
        rsi: rsi_value,
        rsi_signal: rsi_value.map(|value| rsi_signal(value).to_string()),
        macd: macd_values.map(|(line, _, _)| line),
        macd_signal: macd_values.map(|(_, signal, _)| signal),
        macd_histogram: macd_values.map(|(_, _, histogram)| histogram),
        macd_trend: macd_values.map(|(line, signal, _)| {
            let trend = if line > signal { "Bullish" } else { "Bearish" };
            trend.to_string()
        }),
        ma_50,
        ma_200,
        above_ma50: ma_50.map(|ma| latest.close > ma),
        above_ma200: ma_200.map(|ma| latest.close > ma),
        atr: atr_value,
        current_volume: latest.volume,
        avg_volume_20,
        volume_ratio,
    })
}
