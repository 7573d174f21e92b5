// * Telemetry - JSON Logging and Prometheus Metrics
// * Provides structured logging and pipeline metrics for production observability

use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_histogram_vec, Counter,
    CounterVec, Encoder, Gauge, HistogramVec, TextEncoder,
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::settings::LogFormat;
use crate::engine::classifier::SiteType;

// * Filter used when RUST_LOG is unset
const DEFAULT_FILTER: &str = "crawl_refinery=info,info";

/// Pipeline stage a fetch duration belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    /// Short classification fetch
    Probe,
    /// Strategy-driven content fetch
    Full,
}

impl FetchStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Probe => "probe",
            Self::Full => "full",
        }
    }
}

/// Terminal outcome of one URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcomeLabel {
    Success,
    Excluded,
    Insufficient,
    Failed,
}

impl PageOutcomeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Excluded => "excluded",
            Self::Insufficient => "insufficient",
            Self::Failed => "failed",
        }
    }
}

lazy_static! {
    // * Pages by terminal outcome
    pub static ref PAGES_TOTAL: CounterVec = register_counter_vec!(
        "crawl_refinery_pages_total",
        "Total pages handled by terminal outcome",
        &["outcome"]
    ).unwrap();

    // * Fetch duration histogram
    pub static ref FETCH_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "crawl_refinery_fetch_duration_seconds",
        "Fetch duration in seconds by pipeline stage",
        &["stage"],
        vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]
    ).unwrap();

    // * Classification results
    pub static ref SITE_TYPES_TOTAL: CounterVec = register_counter_vec!(
        "crawl_refinery_site_types_total",
        "Pages classified by site type",
        &["site_type"]
    ).unwrap();

    // * Chunks emitted
    pub static ref CHUNKS_TOTAL: Counter = register_counter!(
        "crawl_refinery_chunks_total",
        "Total chunks produced"
    ).unwrap();

    // * Fetch failures by error kind
    pub static ref FETCH_FAILURES_TOTAL: CounterVec = register_counter_vec!(
        "crawl_refinery_fetch_failures_total",
        "Fetch failures by stage and error kind",
        &["stage", "kind"]
    ).unwrap();

    // * Pipelines currently holding a fetch permit
    pub static ref FETCHES_IN_FLIGHT: Gauge = register_gauge!(
        "crawl_refinery_fetches_in_flight",
        "Number of page pipelines currently fetching"
    ).unwrap();
}

/// Initializes the tracing subscriber with JSON formatting
///
/// # Example
/// ```ignore
/// use crawl_refinery::ops::telemetry;
///
/// telemetry::init_tracing();
/// tracing::info!(url = "https://example.com", "Processing page");
/// ```
pub fn init_tracing() {
    init_tracing_with_format(LogFormat::Json);
}

/// Initializes tracing with pretty formatting (for development)
pub fn init_tracing_pretty() {
    init_tracing_with_format(LogFormat::Pretty);
}

/// Initializes tracing in the requested output format
pub fn init_tracing_with_format(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).init(),
    }
}

/// Returns the current metrics as a string
pub fn get_metrics_string() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Records the terminal outcome of a page
pub fn record_page_outcome(outcome: PageOutcomeLabel) {
    PAGES_TOTAL.with_label_values(&[outcome.as_str()]).inc();
}

/// Records a fetch duration for a stage
pub fn record_fetch_duration(stage: FetchStage, seconds: f64) {
    FETCH_DURATION_SECONDS
        .with_label_values(&[stage.as_str()])
        .observe(seconds);
}

/// Records a failed fetch
pub fn record_fetch_failure(stage: FetchStage, kind: &str) {
    FETCH_FAILURES_TOTAL
        .with_label_values(&[stage.as_str(), kind])
        .inc();
}

/// Records a classification result
pub fn record_site_type(site_type: SiteType) {
    SITE_TYPES_TOTAL
        .with_label_values(&[site_type.as_str()])
        .inc();
}

/// Records chunks emitted for one page
pub fn record_chunks(count: usize) {
    CHUNKS_TOTAL.inc_by(count as f64);
}

/// Increments the in-flight fetch gauge
pub fn increment_fetches_in_flight() {
    FETCHES_IN_FLIGHT.inc();
}

/// Decrements the in-flight fetch gauge
pub fn decrement_fetches_in_flight() {
    FETCHES_IN_FLIGHT.dec();
}
