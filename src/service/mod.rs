// * Service facade
// * Entry points for single and batch crawls, plus the liveness probe.

pub mod types;

pub use types::{BatchCrawlRequest, CrawlFailure, CrawlRequest, CrawlResponse, HealthStatus};

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::constants::MAX_BATCH_URLS;
use crate::config::ServiceConfig;
use crate::engine::orchestrator::{BatchItem, PageOutcome, PagePipeline, PipelineError};
use crate::network::fetcher::PageFetcher;

/// Crawl service over a fetch engine
pub struct CrawlService<F> {
    pipeline: Arc<PagePipeline<F>>,
    config: ServiceConfig,
}

impl<F: PageFetcher + 'static> CrawlService<F> {
    pub fn new(fetcher: F) -> Self {
        Self::with_config(fetcher, ServiceConfig::default())
    }

    pub fn with_config(fetcher: F, config: ServiceConfig) -> Self {
        Self {
            pipeline: Arc::new(PagePipeline::new(fetcher)),
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &PagePipeline<F> {
        &self.pipeline
    }

    /// Crawls one URL.
    ///
    /// Excluded URLs produce an empty response with `total_count` 0. Pages with
    /// too little content count as attempted but not successful.
    pub async fn crawl(&self, request: &CrawlRequest) -> Result<CrawlResponse, PipelineError> {
        let response = match self.pipeline.process(request).await? {
            PageOutcome::Excluded { .. } => CrawlResponse::default(),
            PageOutcome::Insufficient { .. } => CrawlResponse {
                total_count: 1,
                ..Default::default()
            },
            PageOutcome::Processed(page) => CrawlResponse {
                pages: vec![page],
                total_count: 1,
                success_count: 1,
                failures: Vec::new(),
            },
        };
        Ok(response)
    }

    /// Crawls up to `MAX_BATCH_URLS` URLs concurrently. Never fails as a whole.
    pub async fn crawl_batch(&self, request: &BatchCrawlRequest) -> CrawlResponse {
        self.crawl_batch_with_cancel(request, CancellationToken::new())
            .await
    }

    /// Batch crawl that stops early when `cancel` fires, returning what completed
    pub async fn crawl_batch_with_cancel(
        &self,
        request: &BatchCrawlRequest,
        cancel: CancellationToken,
    ) -> CrawlResponse {
        if request.urls.len() > MAX_BATCH_URLS {
            warn!(
                requested = request.urls.len(),
                limit = MAX_BATCH_URLS,
                "Batch exceeds URL limit, extra URLs dropped"
            );
        }

        let requests: Vec<CrawlRequest> = request
            .urls
            .iter()
            .take(MAX_BATCH_URLS)
            .map(|url| CrawlRequest {
                depth: request.depth,
                max_pages: request.max_pages,
                ..CrawlRequest::new(url.as_str())
            })
            .collect();
        let total_count = requests.len();

        let items = self
            .pipeline
            .process_batch(requests, self.config.max_concurrent_fetches, &cancel)
            .await;

        let response = aggregate(items, total_count);
        info!(
            total = response.total_count,
            succeeded = response.success_count,
            failed = response.failures.len(),
            "Batch complete"
        );
        response
    }

    /// Liveness probe
    pub fn health(&self) -> HealthStatus {
        HealthStatus::healthy()
    }
}

// * Only processed pages count toward success; errors are reported per URL
fn aggregate(items: Vec<BatchItem>, total_count: usize) -> CrawlResponse {
    let mut response = CrawlResponse {
        total_count,
        ..Default::default()
    };

    for (url, result) in items {
        match result {
            Ok(PageOutcome::Processed(page)) => response.pages.push(page),
            Ok(PageOutcome::Excluded { .. } | PageOutcome::Insufficient { .. }) => {}
            Err(e) => response.failures.push(CrawlFailure {
                url,
                error: e.to_string(),
            }),
        }
    }

    response.success_count = response.pages.len();
    response
}
