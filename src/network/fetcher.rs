// * Fetch boundary contract.
// * The pipeline never inspects how a page was rendered; it only consumes RawPage.

use htmd::options::{HeadingStyle, Options};
use htmd::HtmlToMarkdown;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, LazyLock};

use crate::engine::strategy::FetchStrategy;
use crate::network::errors::FetchError;

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());

// * Tags whose content never belongs in page markdown
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "svg", "iframe"];

/// Output of a fetch engine. Read-only input to the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawPage {
    /// Final URL after redirects
    pub url: String,
    pub markdown: String,
    pub html: Option<String>,
    pub title: String,
    pub success: bool,
    pub error_message: Option<String>,
}

impl RawPage {
    /// Successful fetch result
    pub fn ok(
        url: impl Into<String>,
        title: impl Into<String>,
        markdown: impl Into<String>,
        html: Option<String>,
    ) -> Self {
        Self {
            url: url.into(),
            markdown: markdown.into(),
            html,
            title: title.into(),
            success: true,
            error_message: None,
        }
    }

    /// Fetch the engine completed but reported as failed
    pub fn failed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            success: false,
            error_message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Markup to classify on: raw HTML when present, markdown otherwise
    pub fn markup(&self) -> &str {
        self.html.as_deref().unwrap_or(&self.markdown)
    }
}

/// Boxed future returned by fetchers
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<RawPage, FetchError>> + Send + 'a>>;

/// Anything that can turn a URL plus a strategy into a RawPage
pub trait PageFetcher: Send + Sync {
    /// Fetches one page. Implementations should honour `strategy.page_timeout_ms`;
    /// the pipeline enforces it as well.
    fn fetch<'a>(&'a self, url: &'a str, strategy: &'a FetchStrategy) -> FetchFuture<'a>;
}

// * Shared ownership support
impl<T: PageFetcher + ?Sized> PageFetcher for Arc<T> {
    fn fetch<'a>(&'a self, url: &'a str, strategy: &'a FetchStrategy) -> FetchFuture<'a> {
        (**self).fetch(url, strategy)
    }
}

/// Converts rendered HTML to markdown, dropping script/style payloads
pub fn html_to_markdown(html: &str) -> Result<String, FetchError> {
    // * ATX headings are what the chunker splits on
    HtmlToMarkdown::builder()
        .options(Options {
            heading_style: HeadingStyle::Atx,
            ..Default::default()
        })
        .skip_tags(SKIPPED_TAGS.to_vec())
        .build()
        .convert(html)
        .map_err(|e| FetchError::Conversion(e.to_string()))
}

/// Extracts the trimmed `<title>` text, if any
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markup_prefers_html() {
        let page = RawPage::ok("https://a.com", "A", "# md", Some("<h1>html</h1>".into()));
        assert_eq!(page.markup(), "<h1>html</h1>");

        let page = RawPage::ok("https://a.com", "A", "# md", None);
        assert_eq!(page.markup(), "# md");
    }

    #[test]
    fn test_failed_page() {
        let page = RawPage::failed("https://a.com", "net::ERR_NAME_NOT_RESOLVED");
        assert!(!page.success);
        assert_eq!(page.error_message.as_deref(), Some("net::ERR_NAME_NOT_RESOLVED"));
        assert!(page.markdown.is_empty());
    }

    #[test]
    fn test_extract_title() {
        let html = "<html><head><title>  Hello Page </title></head><body></body></html>";
        assert_eq!(extract_title(html), Some("Hello Page".to_string()));
        assert_eq!(extract_title("<html><body>none</body></html>"), None);
    }

    #[test]
    fn test_html_to_markdown_keeps_headings_drops_scripts() {
        let html = "<html><body><h2>Section</h2><p>Body text</p><script>var x = 1;</script></body></html>";
        let md = html_to_markdown(html).unwrap();
        assert!(md.contains("## Section"));
        assert!(md.contains("Body text"));
        assert!(!md.contains("var x"));
    }
}
