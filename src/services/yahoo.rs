use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;

use crate::errors::ScanError;
use crate::models::price::{PricePoint, PriceSeries};
use crate::services::market_data::MarketDataProvider;

const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko)";
const SECONDS_PER_YEAR: i64 = 365 * 86_400;

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Quote {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<f64>>,
}

#[derive(Clone)]
pub struct YahooClient {
    client: reqwest::Client,
}

impl YahooClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self { client })
    }

    /// Fetch weekly bars for a ticker between two epoch-second bounds
    pub async fn fetch_weekly_bars(
        &self,
        ticker: &str,
        start_time: i64,
        end_time: i64,
    ) -> anyhow::Result<PriceSeries> {
        let url = format!("{}/{}", YAHOO_CHART_URL, yahoo_symbol(ticker));
        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", start_time.to_string()),
                ("period2", end_time.to_string()),
                ("interval", "1wk".to_string()),
                ("events", "history".to_string()),
            ])
            .send()
            .await
            .context("chart request failed")?
            .error_for_status()
            .context("chart request rejected")?
            .json::<ChartResponse>()
            .await
            .context("chart response malformed")?;

        parse_chart(ticker, response)
    }
}

#[async_trait]
impl MarketDataProvider for YahooClient {
    async fn fetch_weekly_series(
        &self,
        ticker: &str,
        lookback_years: u32,
    ) -> Result<PriceSeries, ScanError> {
        let now = chrono::Utc::now().timestamp();
        let (start_time, end_time) = build_time_range(now, lookback_years);

        self.fetch_weekly_bars(ticker, start_time, end_time)
            .await
            .map_err(|error| ScanError::DataUnavailable {
                ticker: ticker.to_string(),
                reason: format!("{:#}", error),
            })
    }
}

/// Class shares use a dash on Yahoo (BRK.B -> BRK-B)
fn yahoo_symbol(ticker: &str) -> String {
    ticker.trim().to_uppercase().replace('.', "-")
}

fn build_time_range(now: i64, lookback_years: u32) -> (i64, i64) {
    let span = SECONDS_PER_YEAR.saturating_mul(i64::from(lookback_years));
    (now.saturating_sub(span), now)
}

fn parse_chart(ticker: &str, response: ChartResponse) -> anyhow::Result<PriceSeries> {
    if let Some(error) = response.chart.error {
        bail!("{}: {}", error.code, error.description);
    }
    let result = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .context("no chart result")?;
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let points: Vec<PricePoint> = result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let field = |values: &[Option<f64>]| values.get(i).copied().flatten();
            Some(PricePoint {
                date: DateTime::from_timestamp(ts, 0)?.date_naive(),
                open: field(&quote.open)?,
                high: field(&quote.high)?,
                low: field(&quote.low)?,
                close: field(&quote.close)?,
                volume: field(&quote.volume).unwrap_or(0.0),
            })
        })
        .collect();

    if points.is_empty() {
        bail!("no bars returned");
    }
    Ok(PriceSeries::new(ticker, points))
}
