use crate::engine::strategy::FetchStrategy;
use crate::network::errors::FetchError;
use crate::network::fetcher::{extract_title, html_to_markdown, FetchFuture, PageFetcher, RawPage};
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL};
use reqwest::Client;
use std::sync::LazyLock;
use tracing::debug;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
                          Chrome/120.0.0.0 Safari/537.36";

static BAN_TITLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<title[^>]*>[^<]*(Just a moment|Attention Required|Security Check|Access Denied|Captcha)")
        .unwrap()
});

// * Challenge-page fingerprints that appear in the body of WAF interstitials
const BAN_SIGNATURES: &[&str] = &["captcha-delivery", "cf-turnstile", "datadome", "challenge-platform"];

// * The plain-HTTP fetch engine. No JavaScript; render-wait fields of the strategy
// * are ignored, the timeout and cache flag are honoured.
pub struct FastClient {
    inner: Client,
}

impl FastClient {
    // * @param proxy_url - Optional proxy URL (e.g., "http://user:pass@ip:port")
    pub fn new(proxy_url: Option<&str>) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .cookie_store(true)
            .gzip(true)
            .brotli(true);

        // * Only the explicit proxy is used; environment proxies are ignored
        builder = match proxy_url {
            Some(url) => builder.proxy(reqwest::Proxy::all(url)?),
            None => builder.no_proxy(),
        };

        Ok(Self {
            inner: builder.build()?,
        })
    }

    // * Fetches a URL, validates it against ban rules and converts it to markdown.
    pub async fn fetch_page(&self, url: &str, strategy: &FetchStrategy) -> Result<RawPage, FetchError> {
        let mut request = self.inner.get(url).timeout(strategy.page_timeout());
        if strategy.bypass_cache {
            request = request.header(CACHE_CONTROL, "no-cache");
        }

        let resp = request.send().await?;
        let status = resp.status();
        let final_url = resp.url().to_string();

        if status.as_u16() == 403 || status.as_u16() == 429 {
            return Err(FetchError::HardBan(status.as_u16()));
        }

        let resp = resp.error_for_status()?;
        let body = resp.text().await?;

        if body.trim().is_empty() {
            return Err(FetchError::EmptyResponse(body.len()));
        }

        detect_soft_ban(&body)?;

        let title = extract_title(&body).unwrap_or_default();
        let markdown = html_to_markdown(&body)?;
        debug!(url = %final_url, bytes = body.len(), "Fast path fetch complete");

        Ok(RawPage::ok(final_url, title, markdown, Some(body)))
    }
}

impl PageFetcher for FastClient {
    fn fetch<'a>(&'a self, url: &'a str, strategy: &'a FetchStrategy) -> FetchFuture<'a> {
        Box::pin(self.fetch_page(url, strategy))
    }
}

fn detect_soft_ban(body: &str) -> Result<(), FetchError> {
    if let Some(cap) = BAN_TITLE_REGEX.captures(body).and_then(|c| c.get(1)) {
        return Err(FetchError::SoftBan(format!("Title Trigger: {}", cap.as_str())));
    }

    for sig in BAN_SIGNATURES {
        if body.contains(sig) {
            return Err(FetchError::SoftBan(format!("Body Trigger: {}", sig)));
        }
    }

    Ok(())
}
