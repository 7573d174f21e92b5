// * Crawl engine: per-URL decisions and the page pipeline

pub mod classifier;
pub mod fingerprint;
pub mod normalization;
pub mod orchestrator;
pub mod slow_path;
pub mod strategy;

pub use classifier::{classify, SiteType};
pub use fingerprint::ContentFingerprint;
pub use normalization::{canonicalize, is_excluded, UrlFilter};
pub use orchestrator::{PageOutcome, PagePipeline, PipelineError};
pub use slow_path::BrowserFetcher;
pub use strategy::{select_strategy, FetchStrategy, StrategyParams, WaitCondition};
