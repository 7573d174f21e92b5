use crawl_refinery::engine::{FetchStrategy, SiteType};
use crawl_refinery::network::{FastClient, FetchError, PageFetcher};
use crawl_refinery::service::{CrawlRequest, CrawlService};
use mockito::Server;

const DOC_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>Install Guide</title></head>
<body>
  <nav><a href="/">Home</a></nav>
  <h1>Install Guide</h1>
  <p>Download the release archive for your platform and unpack it into a directory on your PATH.</p>
  <h2>Verify</h2>
  <p>Run the binary with the version flag and confirm it prints the expected release number.</p>
  <script>window.analytics = true;</script>
</body>
</html>"#;

#[tokio::test]
async fn test_client_initialization() {
    let client = FastClient::new(None);
    assert!(client.is_ok());
}

#[tokio::test]
async fn test_fetch_converts_html_to_markdown() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/guide")
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(DOC_HTML)
        .create_async()
        .await;

    let client = FastClient::new(None).unwrap();
    let url = format!("{}/guide", server.url());
    let page = client.fetch(&url, &FetchStrategy::quick_probe()).await.unwrap();

    mock.assert_async().await;
    assert!(page.success);
    assert_eq!(page.url, url);
    assert_eq!(page.title, "Install Guide");
    assert!(page.markdown.contains("# Install Guide"));
    assert!(page.markdown.contains("## Verify"));
    assert!(!page.markdown.contains("analytics"));
    assert!(page.html.as_deref().is_some_and(|h| h.contains("<h2>Verify</h2>")));
}

#[tokio::test]
async fn test_bypass_cache_sends_no_cache() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/fresh")
        .match_header("cache-control", "no-cache")
        .with_status(200)
        .with_body(DOC_HTML)
        .create_async()
        .await;

    let client = FastClient::new(None).unwrap();
    let strategy = FetchStrategy::quick_probe();
    assert!(strategy.bypass_cache);
    client
        .fetch(&format!("{}/fresh", server.url()), &strategy)
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_hard_ban_status() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/blocked")
        .with_status(429)
        .create_async()
        .await;

    let client = FastClient::new(None).unwrap();
    let err = client
        .fetch(&format!("{}/blocked", server.url()), &FetchStrategy::quick_probe())
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::HardBan(429)));
}

#[tokio::test]
async fn test_server_error_is_http_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/broken")
        .with_status(500)
        .with_body("Error")
        .create_async()
        .await;

    let client = FastClient::new(None).unwrap();
    let err = client
        .fetch(&format!("{}/broken", server.url()), &FetchStrategy::quick_probe())
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Http(_)));
}

#[tokio::test]
async fn test_challenge_page_is_soft_ban() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/challenge")
        .with_status(200)
        .with_body("<html><head><title>Just a moment...</title></head><body></body></html>")
        .create_async()
        .await;

    let client = FastClient::new(None).unwrap();
    let err = client
        .fetch(&format!("{}/challenge", server.url()), &FetchStrategy::quick_probe())
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::SoftBan(_)));
}

#[tokio::test]
async fn test_empty_body() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/empty")
        .with_status(200)
        .with_body("   ")
        .create_async()
        .await;

    let client = FastClient::new(None).unwrap();
    let err = client
        .fetch(&format!("{}/empty", server.url()), &FetchStrategy::quick_probe())
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::EmptyResponse(_)));
}

#[tokio::test]
async fn test_service_over_http_client() {
    let mut server = Server::new_async().await;
    // * Probe and full fetch both hit the page
    let mock = server
        .mock("GET", "/docs/install")
        .with_status(200)
        .with_body(DOC_HTML)
        .expect(2)
        .create_async()
        .await;

    let service = CrawlService::new(FastClient::new(None).unwrap());
    let response = service
        .crawl(&CrawlRequest::new(format!("{}/docs/install/", server.url())))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(response.success_count, 1);

    let page = &response.pages[0];
    assert_eq!(page.website_type, SiteType::Documentation);
    assert_eq!(page.title, "Install Guide");
    assert_eq!(page.source_url, format!("{}/docs/install", server.url()));
    assert!(page.chunk_count() >= 1);
}
