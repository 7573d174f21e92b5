// * The Refinery (Extraction Pipeline)
// * Turns an already-fetched RawPage into a PageResult: clean, fingerprint, chunk.
// * Performs no I/O; the orchestrator owns fetching.

pub mod chunker;
pub mod content_cleaner;

// * Re-exports for convenient access
pub use chunker::{chunk_markdown, estimate_tokens, Chunk, ChunkerConfig, HeadingChunker};
pub use content_cleaner::{clean_markdown, CleanedContent, ContentCleaner};

use serde::{Deserialize, Serialize};

use crate::config::constants::{MIN_CONTENT_CHARS, UNTITLED_PAGE};
use crate::engine::classifier::SiteType;
use crate::engine::fingerprint::ContentFingerprint;
use crate::network::fetcher::RawPage;

/// Final per-page output. Never mutated after construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageResult {
    /// Resolved URL reported by the fetcher
    pub url: String,
    /// Canonical URL that was requested
    pub source_url: String,
    pub title: String,
    /// Cleaned markdown
    pub markdown: String,
    pub content_hash: ContentFingerprint,
    pub website_type: SiteType,
    /// Absent when chunking is disabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunks: Option<Vec<Chunk>>,
}

impl PageResult {
    pub fn chunk_count(&self) -> usize {
        self.chunks.as_ref().map_or(0, Vec::len)
    }

    /// Converts result to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// What the refinery made of a page
#[derive(Debug, Clone, PartialEq)]
pub enum Refined {
    /// Cleaned content fell under the admissibility threshold
    Insufficient { chars: usize },
    Page(PageResult),
}

/// Configuration for the refinery pipeline
#[derive(Debug, Clone)]
pub struct RefineryConfig {
    /// Chunker configuration
    pub chunker: ChunkerConfig,
    /// Cleaned pages shorter than this are dropped
    pub min_content_chars: usize,
    /// Whether to generate chunks
    pub generate_chunks: bool,
}

impl Default for RefineryConfig {
    fn default() -> Self {
        Self {
            chunker: ChunkerConfig::default(),
            min_content_chars: MIN_CONTENT_CHARS,
            generate_chunks: true,
        }
    }
}

/// The main refinery pipeline for processing fetched pages
///
/// # Example
/// ```ignore
/// use crawl_refinery::refinery::Refinery;
///
/// let refinery = Refinery::new();
/// let refined = refinery.process(&raw_page, "https://example.com/docs", SiteType::Documentation);
/// ```
pub struct Refinery {
    config: RefineryConfig,
    cleaner: ContentCleaner,
    chunker: HeadingChunker,
}

impl Refinery {
    /// Creates a new refinery with default configuration
    pub fn new() -> Self {
        Self::with_config(RefineryConfig::default())
    }

    /// Creates a new refinery with custom configuration
    pub fn with_config(config: RefineryConfig) -> Self {
        Self {
            cleaner: ContentCleaner::new(),
            chunker: HeadingChunker::with_config(config.chunker),
            config,
        }
    }

    pub fn config(&self) -> &RefineryConfig {
        &self.config
    }

    /// Processes a fetched page through the refinery
    ///
    /// # Pipeline Steps:
    /// 1. Remove boilerplate lines and navigation sections
    /// 2. Reject pages under the minimum content length
    /// 3. Fingerprint the cleaned content
    /// 4. Generate heading-aware chunks (when enabled)
    pub fn process(&self, page: &RawPage, source_url: &str, site_type: SiteType) -> Refined {
        self.process_with(page, source_url, site_type, self.config.generate_chunks)
    }

    /// Same as `process`, with a per-call chunking override
    pub fn process_with(
        &self,
        page: &RawPage,
        source_url: &str,
        site_type: SiteType,
        generate_chunks: bool,
    ) -> Refined {
        let cleaned = self.cleaner.clean(&page.markdown);
        if !cleaned.is_sufficient_with(self.config.min_content_chars) {
            return Refined::Insufficient {
                chars: cleaned.char_len(),
            };
        }

        let title = match page.title.trim() {
            "" => UNTITLED_PAGE,
            t => t,
        };
        let content_hash = ContentFingerprint::compute(&cleaned.text);
        let chunks = generate_chunks.then(|| self.chunker.chunk(&cleaned.text, &page.url, title));

        Refined::Page(PageResult {
            url: page.url.clone(),
            source_url: source_url.to_string(),
            title: title.to_string(),
            markdown: cleaned.text,
            content_hash,
            website_type: site_type,
            chunks,
        })
    }
}

impl Default for Refinery {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(markdown: &str, title: &str) -> RawPage {
        RawPage::ok("https://example.com/docs/intro", title, markdown, None)
    }

    fn body() -> String {
        format!(
            "# Intro\n{}\n\n## Usage\n{}\n\n© 2024 Example Inc.",
            "Getting started with the tool. ".repeat(4),
            "Call the API with a token. ".repeat(4)
        )
    }

    #[test]
    fn test_refinery_produces_page() {
        let refinery = Refinery::new();
        let raw = page(&body(), "Intro");

        let Refined::Page(result) = refinery.process(&raw, "https://example.com/docs/intro", SiteType::Documentation)
        else {
            panic!("expected a page");
        };

        assert_eq!(result.title, "Intro");
        assert_eq!(result.website_type, SiteType::Documentation);
        assert!(!result.markdown.contains("©"));
        assert_eq!(result.content_hash, ContentFingerprint::compute(&result.markdown));

        let chunks = result.chunks.as_ref().unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].section_heading, "Usage");
        let total: usize = chunks.iter().map(|c| c.text.chars().count()).sum();
        assert!(total >= MIN_CONTENT_CHARS);
    }

    #[test]
    fn test_insufficient_content() {
        let refinery = Refinery::new();
        let raw = page("Short.\n\nPrivacy Policy\nBack to top", "Tiny");

        assert!(matches!(
            refinery.process(&raw, "https://example.com/tiny", SiteType::Standard),
            Refined::Insufficient { chars: 6 }
        ));
    }

    #[test]
    fn test_chunking_disabled() {
        let refinery = Refinery::new();
        let raw = page(&body(), "Intro");

        let Refined::Page(result) = refinery.process_with(&raw, "https://example.com/docs/intro", SiteType::Standard, false)
        else {
            panic!("expected a page");
        };
        assert!(result.chunks.is_none());
        assert!(!result.to_json().contains("\"chunks\""));
    }

    #[test]
    fn test_missing_title_falls_back() {
        let refinery = Refinery::new();
        let raw = page(&body(), "   ");

        let Refined::Page(result) = refinery.process(&raw, "https://example.com/docs/intro", SiteType::Standard)
        else {
            panic!("expected a page");
        };
        assert_eq!(result.title, UNTITLED_PAGE);
        assert_eq!(result.chunks.unwrap()[0].page_title, UNTITLED_PAGE);
    }
}
