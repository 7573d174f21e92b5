// * Service settings with environment overrides.
// * Malformed values never abort startup; they fall back to defaults with a warning.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

use crate::config::constants::DEFAULT_MAX_CONCURRENT_FETCHES;

pub const ENV_MAX_CONCURRENCY: &str = "CRAWL_REFINERY_MAX_CONCURRENCY";
pub const ENV_ENGINE: &str = "CRAWL_REFINERY_ENGINE";
pub const ENV_LOG_FORMAT: &str = "CRAWL_REFINERY_LOG_FORMAT";

/// Which fetch adapter the binary wires into the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FetchEngine {
    /// Plain HTTP client, no JavaScript execution
    Http,
    /// Headless Chromium
    #[default]
    Browser,
}

impl FromStr for FetchEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "browser" => Ok(Self::Browser),
            other => Err(format!("unknown fetch engine '{}'", other)),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Top-level service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Upper bound on page pipelines fetching at the same time.
    /// Sized independently of the per-call batch cap.
    pub max_concurrent_fetches: usize,
    pub engine: FetchEngine,
    pub log_format: LogFormat,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
            engine: FetchEngine::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl ServiceConfig {
    /// Builds the configuration from process environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_MAX_CONCURRENCY) {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.max_concurrent_fetches = n,
                _ => warn!(
                    key = ENV_MAX_CONCURRENCY,
                    value = %raw,
                    "Ignoring invalid concurrency override"
                ),
            }
        }

        if let Some(raw) = lookup(ENV_ENGINE) {
            match raw.parse() {
                Ok(engine) => config.engine = engine,
                Err(e) => warn!(key = ENV_ENGINE, error = %e, "Ignoring invalid engine override"),
            }
        }

        if let Some(raw) = lookup(ENV_LOG_FORMAT) {
            match raw.parse() {
                Ok(format) => config.log_format = format,
                Err(e) => warn!(key = ENV_LOG_FORMAT, error = %e, "Ignoring invalid log format"),
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_overrides() {
        let config = ServiceConfig::from_lookup(|_| None);
        assert_eq!(config.max_concurrent_fetches, DEFAULT_MAX_CONCURRENT_FETCHES);
        assert_eq!(config.engine, FetchEngine::Browser);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_overrides_applied() {
        let config = ServiceConfig::from_lookup(lookup_from(&[
            (ENV_MAX_CONCURRENCY, "8"),
            (ENV_ENGINE, "HTTP"),
            (ENV_LOG_FORMAT, "pretty"),
        ]));
        assert_eq!(config.max_concurrent_fetches, 8);
        assert_eq!(config.engine, FetchEngine::Http);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = ServiceConfig::from_lookup(lookup_from(&[
            (ENV_MAX_CONCURRENCY, "0"),
            (ENV_ENGINE, "carrier-pigeon"),
            (ENV_LOG_FORMAT, "xml"),
        ]));
        assert_eq!(config.max_concurrent_fetches, DEFAULT_MAX_CONCURRENT_FETCHES);
        assert_eq!(config.engine, FetchEngine::Browser);
        assert_eq!(config.log_format, LogFormat::Json);
    }
}
