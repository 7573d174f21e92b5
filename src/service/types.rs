// * Caller-facing request/response shapes

use serde::{Deserialize, Serialize};

use crate::config::constants::{
    DEFAULT_CRAWL_DEPTH, DEFAULT_MAX_PAGES, DEFAULT_REQUEST_TIMEOUT_SECS, SERVICE_NAME,
    SERVICE_VERSION,
};
use crate::engine::strategy::StrategyParams;
use crate::refinery::PageResult;

fn default_depth() -> u32 {
    DEFAULT_CRAWL_DEPTH
}

fn default_max_pages() -> u32 {
    DEFAULT_MAX_PAGES
}

fn default_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_true() -> bool {
    true
}

/// Single-URL crawl request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrawlRequest {
    pub url: String,
    /// Accepted for compatibility; link following is not performed
    #[serde(default = "default_depth")]
    pub depth: u32,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    /// Regexes the canonical URL must match (any)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_patterns: Option<Vec<String>>,
    /// Regexes that reject the canonical URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_patterns: Option<Vec<String>>,
    #[serde(default = "default_true")]
    pub bypass_cache: bool,
    #[serde(default = "default_true")]
    pub enable_chunking: bool,
    #[serde(default = "default_true")]
    pub wait_for_js: bool,
    /// Full-fetch timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl CrawlRequest {
    /// Request with every option at its default
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            depth: DEFAULT_CRAWL_DEPTH,
            max_pages: DEFAULT_MAX_PAGES,
            include_patterns: None,
            exclude_patterns: None,
            bypass_cache: true,
            enable_chunking: true,
            wait_for_js: true,
            timeout: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    pub fn strategy_params(&self) -> StrategyParams {
        StrategyParams {
            timeout_secs: self.timeout,
            bypass_cache: self.bypass_cache,
            wait_for_js: self.wait_for_js,
        }
    }
}

/// Multi-URL crawl request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchCrawlRequest {
    pub urls: Vec<String>,
    #[serde(default = "default_depth")]
    pub depth: u32,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

impl BatchCrawlRequest {
    pub fn new(urls: Vec<String>) -> Self {
        Self {
            urls,
            depth: DEFAULT_CRAWL_DEPTH,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

/// One URL that failed inside a batch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrawlFailure {
    pub url: String,
    pub error: String,
}

/// Aggregated crawl result
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CrawlResponse {
    pub pages: Vec<PageResult>,
    /// URLs attempted
    pub total_count: usize,
    /// PageResults returned
    pub success_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<CrawlFailure>,
}

impl CrawlResponse {
    /// Converts response to pretty JSON string
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Liveness probe payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
}

impl HealthStatus {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            service: SERVICE_NAME.to_string(),
            version: SERVICE_VERSION.to_string(),
        }
    }
}
