// * Page Pipeline Orchestrator
// * Composes canonicalize -> exclusion -> quick probe -> classify -> strategy -> full fetch -> refinery
// * for one URL, and fans that pipeline out over a batch with bounded concurrency.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::classifier::{classify, SiteType};
use crate::engine::normalization::{canonicalize, UrlFilter};
use crate::engine::strategy::{select_strategy, FetchStrategy};
use crate::network::errors::FetchError;
use crate::network::fetcher::{PageFetcher, RawPage};
use crate::ops::telemetry::{self, FetchStage, PageOutcomeLabel};
use crate::refinery::{PageResult, Refined, Refinery};
use crate::service::types::CrawlRequest;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to crawl {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Unexpected failure while crawling {url}: {message}")]
    Unexpected { url: String, message: String },
}

/// Non-error terminal states of one URL
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    /// Matched an exclusion rule; nothing was fetched
    Excluded { url: String },
    /// Fetched, but too little content survived cleaning
    Insufficient { url: String },
    Processed(PageResult),
}

impl PageOutcome {
    pub fn into_page(self) -> Option<PageResult> {
        match self {
            Self::Processed(page) => Some(page),
            _ => None,
        }
    }
}

// * Keeps the in-flight gauge honest on every exit path, panics included
struct InFlightGuard;

impl InFlightGuard {
    fn enter() -> Self {
        telemetry::increment_fetches_in_flight();
        Self
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        telemetry::decrement_fetches_in_flight();
    }
}

/// Single-URL pipeline over a fetch engine
pub struct PagePipeline<F> {
    fetcher: F,
    refinery: Refinery,
}

impl<F: PageFetcher> PagePipeline<F> {
    pub fn new(fetcher: F) -> Self {
        Self::with_refinery(fetcher, Refinery::new())
    }

    pub fn with_refinery(fetcher: F, refinery: Refinery) -> Self {
        Self { fetcher, refinery }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Runs the full pipeline for one request
    pub async fn process(&self, request: &CrawlRequest) -> Result<PageOutcome, PipelineError> {
        let filter = UrlFilter::new(
            request.include_patterns.as_deref().unwrap_or_default(),
            request.exclude_patterns.as_deref().unwrap_or_default(),
        )
        .map_err(|e| PipelineError::InvalidRequest(format!("invalid url pattern: {}", e)))?;

        let url = canonicalize(&request.url);
        if filter.rejects(&url) {
            info!(url = %url, "Skipping excluded URL");
            telemetry::record_page_outcome(PageOutcomeLabel::Excluded);
            return Ok(PageOutcome::Excluded { url });
        }

        let site_type = self.probe_site_type(&url).await;
        telemetry::record_site_type(site_type);

        let strategy = select_strategy(site_type, &request.strategy_params());
        debug!(url = %url, site_type = %site_type, wait_until = ?strategy.wait_until, "Strategy selected");

        let page = match self.timed_fetch(&url, &strategy, FetchStage::Full).await {
            Ok(page) => page,
            Err(e) => {
                warn!(url = %url, error = %e, "Full fetch failed");
                telemetry::record_page_outcome(PageOutcomeLabel::Failed);
                return Err(PipelineError::Fetch {
                    url,
                    message: e.to_string(),
                });
            }
        };

        match self
            .refinery
            .process_with(&page, &url, site_type, request.enable_chunking)
        {
            Refined::Insufficient { chars } => {
                warn!(url = %url, chars, "Insufficient content after cleaning");
                telemetry::record_page_outcome(PageOutcomeLabel::Insufficient);
                Ok(PageOutcome::Insufficient { url })
            }
            Refined::Page(result) => {
                info!(
                    url = %result.url,
                    site_type = %site_type,
                    chars = result.markdown.chars().count(),
                    chunks = result.chunk_count(),
                    "Page processed"
                );
                telemetry::record_chunks(result.chunk_count());
                telemetry::record_page_outcome(PageOutcomeLabel::Success);
                Ok(PageOutcome::Processed(result))
            }
        }
    }

    // * Classification probe. Any failure falls back to Standard.
    async fn probe_site_type(&self, url: &str) -> SiteType {
        match self.timed_fetch(url, &FetchStrategy::quick_probe(), FetchStage::Probe).await {
            Ok(page) => {
                let site_type = classify(url, page.markup());
                debug!(url, site_type = %site_type, "Site classified");
                site_type
            }
            Err(e) => {
                warn!(url, error = %e, "Classification probe failed, using standard strategy");
                SiteType::Standard
            }
        }
    }

    // * Fetch bounded by the strategy timeout; unsuccessful pages become errors
    async fn timed_fetch(
        &self,
        url: &str,
        strategy: &FetchStrategy,
        stage: FetchStage,
    ) -> Result<RawPage, FetchError> {
        let started = Instant::now();
        let result = tokio::time::timeout(strategy.page_timeout(), self.fetcher.fetch(url, strategy)).await;
        telemetry::record_fetch_duration(stage, started.elapsed().as_secs_f64());

        let outcome = match result {
            Err(_) => Err(FetchError::Timeout(strategy.page_timeout_ms)),
            Ok(Err(e)) => Err(e),
            Ok(Ok(page)) if !page.success => Err(FetchError::Unsuccessful(
                page.error_message
                    .unwrap_or_else(|| "unknown error".to_string()),
            )),
            Ok(Ok(page)) => Ok(page),
        };

        if let Err(e) = &outcome {
            telemetry::record_fetch_failure(stage, e.kind());
        }
        outcome
    }
}

/// Result of one URL inside a batch, keyed by the URL as requested
pub type BatchItem = (String, Result<PageOutcome, PipelineError>);

impl<F: PageFetcher + 'static> PagePipeline<F> {
    /// Runs every request as its own task, at most `max_concurrent` at a time.
    ///
    /// Per-URL failures and panics come back as `Err` items. On cancellation the
    /// unfinished tasks are aborted and only completed items are returned.
    pub async fn process_batch(
        self: &Arc<Self>,
        requests: Vec<CrawlRequest>,
        max_concurrent: usize,
        cancel: &CancellationToken,
    ) -> Vec<BatchItem> {
        let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));
        let mut tasks: JoinSet<BatchItem> = JoinSet::new();

        for request in requests {
            let pipeline = Arc::clone(self);
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                let url = request.url.clone();
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        return (
                            url.clone(),
                            Err(PipelineError::Unexpected {
                                url,
                                message: e.to_string(),
                            }),
                        )
                    }
                };
                let _in_flight = InFlightGuard::enter();

                let result = AssertUnwindSafe(pipeline.process(&request))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| {
                        Err(PipelineError::Unexpected {
                            url: url.clone(),
                            message: panic_message(panic.as_ref()),
                        })
                    });
                (url, result)
            });
        }

        let mut items = Vec::with_capacity(tasks.len());
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    // * Keep results that finished before the cancel was observed
                    while let Some(joined) = tasks.try_join_next() {
                        if let Ok(item) = joined {
                            items.push(item);
                        }
                    }
                    warn!(pending = tasks.len(), completed = items.len(), "Batch cancelled, aborting remaining URLs");
                    tasks.abort_all();

                    // * Aborted fetch futures are dropped before their join completes,
                    // * so adapter cleanup has been scheduled once this loop ends
                    while let Some(joined) = tasks.join_next().await {
                        if let Ok(item) = joined {
                            items.push(item);
                        }
                    }
                    break;
                }
                next = tasks.join_next() => match next {
                    Some(Ok(item)) => items.push(item),
                    Some(Err(e)) => warn!(error = %e, "Batch task did not complete"),
                    None => break,
                },
            }
        }

        items
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("pipeline panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("pipeline panicked: {}", s)
    } else {
        "pipeline panicked".to_string()
    }
}
