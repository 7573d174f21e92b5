// * Configuration Constants
// * Central location for all thresholds, budgets and timeouts

// * Service identity reported by the liveness probe
pub const SERVICE_NAME: &str = "crawl-refinery";
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

// * Cleaned content shorter than this (in chars) is treated as insufficient
pub const MIN_CONTENT_CHARS: usize = 100;

// * Chunk budgets, in estimated tokens
pub const CHUNK_TARGET_TOKENS: usize = 900;
pub const CHUNK_MAX_TOKENS: usize = 1200;
pub const CHUNK_OVERLAP_TOKENS: usize = 100;

// * Fixed token approximation: one token per four characters
pub const CHARS_PER_TOKEN: usize = 4;

// * Classification probe fetch timeout in milliseconds
pub const QUICK_PROBE_TIMEOUT_MS: u64 = 15_000;

// * Default full-fetch timeout in seconds when the caller gives none
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

// * Hard cap on URLs accepted by a single batch call
pub const MAX_BATCH_URLS: usize = 10;

// * Default number of concurrent in-flight page pipelines
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 4;

// * Pass-through request defaults
pub const DEFAULT_CRAWL_DEPTH: u32 = 1;
pub const DEFAULT_MAX_PAGES: u32 = 20;

// * Title used when the fetcher reports none
pub const UNTITLED_PAGE: &str = "Untitled";
