use std::collections::HashSet;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;

use crate::errors::ScanError;

/// Supplies the tickers a scan covers
#[async_trait]
pub trait TickerUniverse: Send + Sync {
    async fn get_tickers(&self) -> Result<Vec<String>, ScanError>;
}

/// Fixed ticker list
#[derive(Debug, Clone)]
pub struct StaticUniverse {
    tickers: Vec<String>,
}

impl StaticUniverse {
    pub fn new(tickers: Vec<String>) -> Self {
        Self {
            tickers: dedup_preserving_order(tickers),
        }
    }
}

#[async_trait]
impl TickerUniverse for StaticUniverse {
    async fn get_tickers(&self) -> Result<Vec<String>, ScanError> {
        if self.tickers.is_empty() {
            return Err(ScanError::UniverseUnavailable(
                "ticker list is empty".to_string(),
            ));
        }
        Ok(self.tickers.clone())
    }
}

/// Index constituents downloaded as CSV with a `Symbol` column
#[derive(Clone)]
pub struct ConstituentsUniverse {
    client: reqwest::Client,
    url: String,
}

impl ConstituentsUniverse {
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    async fn download(&self) -> anyhow::Result<String> {
        self.client
            .get(&self.url)
            .send()
            .await
            .context("constituents request failed")?
            .error_for_status()
            .context("constituents request rejected")?
            .text()
            .await
            .context("constituents body unreadable")
    }
}

#[async_trait]
impl TickerUniverse for ConstituentsUniverse {
    async fn get_tickers(&self) -> Result<Vec<String>, ScanError> {
        let body = self
            .download()
            .await
            .map_err(|error| ScanError::UniverseUnavailable(format!("{:#}", error)))?;
        let tickers = parse_symbol_column(&body).map_err(|error| {
            ScanError::UniverseUnavailable(format!("{}: {:#}", self.url, error))
        })?;

        tracing::info!("Loaded {} tickers from {}", tickers.len(), self.url);
        Ok(tickers)
    }
}

/// Reads the `Symbol` column of a constituents CSV. Quoted fields may hold commas.
fn parse_symbol_column(body: &str) -> anyhow::Result<Vec<String>> {
    let mut lines = body.lines().filter(|line| !line.trim().is_empty());
    let header = lines.next().context("empty constituents file")?;
    let column = split_csv_line(header)
        .iter()
        .position(|name| name.trim().eq_ignore_ascii_case("symbol"))
        .context("no Symbol column")?;

    let tickers: Vec<String> = lines
        .filter_map(|line| split_csv_line(line).into_iter().nth(column))
        .map(|symbol| symbol.trim().to_uppercase())
        .filter(|symbol| !symbol.is_empty())
        .collect();

    anyhow::ensure!(!tickers.is_empty(), "no symbols listed");
    Ok(dedup_preserving_order(tickers))
}

/// Splits one CSV record, unquoting fields and `""` escapes
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

fn dedup_preserving_order(tickers: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tickers
        .into_iter()
        .filter(|ticker| seen.insert(ticker.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_symbol_column_finds_column_by_name() {
        let body = "Security,Symbol,GICS Sector\nApple Inc.,AAPL,Information Technology\n\"Berkshire Hathaway\",BRK.B,Financials\n";
        let tickers = parse_symbol_column(body).unwrap();

        assert_eq!(tickers, vec!["AAPL", "BRK.B"]);
    }

    #[test]
    fn parse_symbol_column_honors_quoted_commas() {
        let body = "Security,Headquarters,Symbol\n\"Apple Inc.\",\"Cupertino, California\",AAPL\n\"Say \"\"Hi\"\", Inc.\",\"New York, New York\",\"hi\"\n";
        let tickers = parse_symbol_column(body).unwrap();

        assert_eq!(tickers, vec!["AAPL", "HI"]);
        assert_eq!(
            split_csv_line("a,\"b, c\",\"d \"\"e\"\"\""),
            vec!["a", "b, c", "d \"e\""]
        );
    }

    #[test]
    fn parse_symbol_column_requires_symbols() {
        assert!(parse_symbol_column("Symbol,Name\n").is_err());
        assert!(parse_symbol_column("Ticker,Name\nAAPL,Apple\n").is_err());
        assert!(parse_symbol_column("").is_err());
    }

    #[tokio::test]
    async fn static_universe_dedups_and_keeps_order() {
        let universe = StaticUniverse::new(vec![
            "MSFT".to_string(),
            "AAPL".to_string(),
            "MSFT".to_string(),
        ]);

        assert_eq!(universe.get_tickers().await.unwrap(), vec!["MSFT", "AAPL"]);
    }

    #[tokio::test]
    async fn empty_static_universe_is_unavailable() {
        let universe = StaticUniverse::new(Vec::new());

        assert!(matches!(
            universe.get_tickers().await,
            Err(ScanError::UniverseUnavailable(_))
        ));
    }
}
