pub mod config;
pub mod engine;
pub mod network;
pub mod ops;
pub mod refinery;
pub mod service;

pub use engine::{PageOutcome, PagePipeline, PipelineError, SiteType};
pub use network::{FetchError, PageFetcher, RawPage};
pub use refinery::{Chunk, PageResult};
pub use service::{BatchCrawlRequest, CrawlRequest, CrawlResponse, CrawlService, HealthStatus};
