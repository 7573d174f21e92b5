use crawl_refinery::config::{FetchEngine, ServiceConfig};
use crawl_refinery::engine::BrowserFetcher;
use crawl_refinery::network::{FastClient, PageFetcher};
use crawl_refinery::ops::telemetry;
use crawl_refinery::service::{BatchCrawlRequest, CrawlRequest, CrawlResponse, CrawlService};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> ExitCode {
    let config = ServiceConfig::from_env();
    telemetry::init_tracing_with_format(config.log_format);

    let urls: Vec<String> = std::env::args().skip(1).collect();
    if urls.is_empty() {
        eprintln!("usage: crawl-refinery <url> [<url>...]");
        return ExitCode::from(2);
    }

    tracing::info!(engine = ?config.engine, urls = urls.len(), "Crawl refinery starting");

    match config.engine {
        FetchEngine::Http => match FastClient::new(None) {
            Ok(client) => run(client, config, urls).await,
            Err(e) => {
                tracing::error!(error = %e, "Failed to build HTTP client");
                ExitCode::FAILURE
            }
        },
        FetchEngine::Browser => {
            let browser = Arc::new(BrowserFetcher::new());
            let code = run(Arc::clone(&browser), config, urls).await;
            browser.shutdown().await;
            code
        }
    }
}

async fn run<F: PageFetcher + 'static>(fetcher: F, config: ServiceConfig, urls: Vec<String>) -> ExitCode {
    let service = CrawlService::with_config(fetcher, config);

    let response: CrawlResponse = if urls.len() == 1 {
        let url = &urls[0];
        match service.crawl(&CrawlRequest::new(url.as_str())).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(url = %url, error = %e, "Crawl failed");
                return ExitCode::FAILURE;
            }
        }
    } else {
        // * Ctrl-C aborts outstanding URLs; completed pages are still printed
        let cancel = CancellationToken::new();
        let on_signal = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                on_signal.cancel();
            }
        });
        service
            .crawl_batch_with_cancel(&BatchCrawlRequest::new(urls), cancel)
            .await
    };

    println!("{}", response.to_json_pretty());
    tracing::debug!(metrics = %telemetry::get_metrics_string(), "Final metrics");
    ExitCode::SUCCESS
}
