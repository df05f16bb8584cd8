use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_UNIVERSE_URL: &str =
    "https://raw.githubusercontent.com/datasets/s-and-p-500-companies/main/data/constituents.csv";

/// Process settings read from the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub lookback_years: u32,
    pub max_concurrency: usize,
    pub scan_interval: Duration,
    pub fetch_timeout: Duration,
    /// Fixed ticker list; the constituents CSV is used when empty
    pub tickers: Vec<String>,
    pub universe_url: String,
    pub log_dir: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            lookback_years: 2,
            max_concurrency: 8,
            scan_interval: Duration::from_secs(86_400),
            fetch_timeout: Duration::from_secs(10),
            tickers: Vec::new(),
            universe_url: DEFAULT_UNIVERSE_URL.to_string(),
            log_dir: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            bind_addr: lookup("FLIP_BIND_ADDR").unwrap_or(defaults.bind_addr),
            lookback_years: parse_or(&lookup, "FLIP_LOOKBACK_YEARS", defaults.lookback_years),
            max_concurrency: parse_or(&lookup, "FLIP_MAX_CONCURRENCY", defaults.max_concurrency)
                .max(1),
            scan_interval: Duration::from_secs(parse_or(
                &lookup,
                "FLIP_SCAN_INTERVAL_SECS",
                defaults.scan_interval.as_secs(),
            )),
            fetch_timeout: Duration::from_secs(parse_or(
                &lookup,
                "FLIP_FETCH_TIMEOUT_SECS",
                defaults.fetch_timeout.as_secs(),
            )),
            tickers: lookup("FLIP_TICKERS")
                .map(|raw| parse_ticker_list(&raw))
                .unwrap_or_default(),
            universe_url: lookup("FLIP_UNIVERSE_URL").unwrap_or(defaults.universe_url),
            log_dir: lookup("FLIP_LOG_DIR").filter(|dir| !dir.is_empty()),
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("{}={:?} is not valid, using {}", key, raw, default);
            default
        }),
        None => default,
    }
}

/// Splits a comma separated list into upper-cased tickers
pub fn parse_ticker_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|ticker| ticker.trim().to_uppercase())
        .filter(|ticker| !ticker.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = config_from(&[]);

        assert_eq!(config.lookback_years, 2);
        assert_eq!(config.max_concurrency, 8);
        assert!(config.tickers.is_empty());
        assert_eq!(config.universe_url, DEFAULT_UNIVERSE_URL);
    }

    #[test]
    fn reads_overrides_and_ignores_garbage() {
        let config = config_from(&[
            ("FLIP_LOOKBACK_YEARS", "3"),
            ("FLIP_MAX_CONCURRENCY", "lots"),
            ("FLIP_TICKERS", " aapl, msft,,brk.b "),
            ("FLIP_SCAN_INTERVAL_SECS", "3600"),
        ]);

        assert_eq!(config.lookback_years, 3);
        assert_eq!(config.max_concurrency, 8);
        assert_eq!(config.tickers, vec!["AAPL", "MSFT", "BRK.B"]);
        assert_eq!(config.scan_interval, Duration::from_secs(3600));
    }

    #[test]
    fn concurrency_is_at_least_one() {
        let config = config_from(&[("FLIP_MAX_CONCURRENCY", "0")]);
        assert_eq!(config.max_concurrency, 1);
    }
}
