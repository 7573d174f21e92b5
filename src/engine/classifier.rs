// * Website Type Classifier
// * Assigns a coarse site-type label used to choose render/wait behaviour.
// * Rules are evaluated in table order, first match wins. Order encodes precedence:
// * an SPA shipping article markup is still an SPA.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SiteType {
    Spa,
    Cms,
    Ecommerce,
    Documentation,
    Pdf,
    Article,
    #[default]
    Standard,
}

impl SiteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spa => "spa",
            Self::Cms => "cms",
            Self::Ecommerce => "ecommerce",
            Self::Documentation => "documentation",
            Self::Pdf => "pdf",
            Self::Article => "article",
            Self::Standard => "standard",
        }
    }

    // * Lenient parse: anything unrecognized is treated as Standard
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "spa" => Self::Spa,
            "cms" => Self::Cms,
            "ecommerce" => Self::Ecommerce,
            "documentation" => Self::Documentation,
            "pdf" => Self::Pdf,
            "article" => Self::Article,
            _ => Self::Standard,
        }
    }
}

impl fmt::Display for SiteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// * Lowercased inputs shared by every rule
struct Signals {
    url: String,
    path: String,
    markup: String,
}

struct Rule {
    label: SiteType,
    matches: fn(&Signals) -> bool,
}

const SPA_MARKERS: &[&str] = &["react", "vue", "angular", "__next", "nuxt", "gatsby"];
const CMS_MARKERS: &[&str] = &["wp-content", "wordpress", "drupal", "joomla"];
const STORE_MARKERS: &[&str] = &["shopify", "woocommerce", "magento", "add-to-cart"];
const DOCS_URL_MARKERS: &[&str] = &["docs.", "/docs/", "documentation", "readme", "wiki"];
const ARTICLE_MARKERS: &[&str] = &["article", "blog-post", "news-item", "byline"];

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

// ! CRITICAL: do not reorder. Precedence is positional.
static RULES: &[Rule] = &[
    Rule {
        label: SiteType::Spa,
        matches: |s| contains_any(&s.markup, SPA_MARKERS),
    },
    Rule {
        label: SiteType::Cms,
        matches: |s| contains_any(&s.markup, CMS_MARKERS),
    },
    Rule {
        label: SiteType::Ecommerce,
        matches: |s| contains_any(&s.markup, STORE_MARKERS),
    },
    Rule {
        label: SiteType::Documentation,
        matches: |s| contains_any(&s.url, DOCS_URL_MARKERS),
    },
    Rule {
        label: SiteType::Pdf,
        matches: |s| s.path.ends_with(".pdf"),
    },
    Rule {
        label: SiteType::Article,
        matches: |s| contains_any(&s.markup, ARTICLE_MARKERS),
    },
];

pub fn classify(url: &str, markup: &str) -> SiteType {
    let url_lower = url.to_lowercase();
    let path = match Url::parse(url) {
        Ok(u) => u.path().to_lowercase(),
        Err(_) => url_lower.clone(),
    };

    let signals = Signals {
        url: url_lower,
        path,
        markup: markup.to_lowercase(),
    };

    RULES
        .iter()
        .find(|rule| (rule.matches)(&signals))
        .map(|rule| rule.label)
        .unwrap_or(SiteType::Standard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cms_marker() {
        let html = r#"<img src="/wp-content/uploads/2024/logo.png">"#;
        assert_eq!(classify("https://example.com/", html), SiteType::Cms);
    }

    #[test]
    fn test_pdf_url() {
        assert_eq!(classify("https://example.com/files/report.PDF", ""), SiteType::Pdf);
        assert_eq!(
            classify("https://example.com/files/report.pdf?download=1", ""),
            SiteType::Pdf
        );
    }

    #[test]
    fn test_spa_beats_article() {
        let html = r#"<div id="__next"><article class="byline">Post</article></div>"#;
        assert_eq!(classify("https://example.com/blog/post", html), SiteType::Spa);
    }

    #[test]
    fn test_markup_rules_beat_url_rules() {
        let html = r#"<script src="https://cdn.shopify.com/s.js"></script>"#;
        assert_eq!(classify("https://docs.example.com/guide", html), SiteType::Ecommerce);
    }

    #[test]
    fn test_documentation_url() {
        assert_eq!(classify("https://docs.rs/tokio", "<p>plain</p>"), SiteType::Documentation);
        assert_eq!(
            classify("https://example.com/docs/getting-started", ""),
            SiteType::Documentation
        );
    }

    #[test]
    fn test_article_markup() {
        let html = r#"<span class="byline">By Jane</span>"#;
        assert_eq!(classify("https://example.com/news/1", html), SiteType::Article);
    }

    #[test]
    fn test_default_standard() {
        assert_eq!(classify("https://example.com/", "<p>hello</p>"), SiteType::Standard);
        assert_eq!(classify("", ""), SiteType::Standard);
    }

    #[test]
    fn test_case_insensitive_markup() {
        assert_eq!(classify("https://example.com/", "Powered by DRUPAL"), SiteType::Cms);
    }

    #[test]
    fn test_label_round_trip_and_fallback() {
        assert_eq!(SiteType::from_label("SPA"), SiteType::Spa);
        assert_eq!(SiteType::from_label("unknown-kind"), SiteType::Standard);
        assert_eq!(SiteType::Documentation.to_string(), "documentation");
    }
}
