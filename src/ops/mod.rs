// * Operations
// * Structured logging and Prometheus metrics for the crawl pipeline

pub mod telemetry;

// * Re-exports for convenient access
pub use telemetry::{
    decrement_fetches_in_flight, get_metrics_string, increment_fetches_in_flight, init_tracing,
    init_tracing_pretty, init_tracing_with_format, record_chunks, record_fetch_duration,
    record_fetch_failure, record_page_outcome, record_site_type, FetchStage, PageOutcomeLabel,
};
