use regex::{Regex, RegexSet};
use std::sync::LazyLock;
use tracing::warn;
use url::form_urlencoded;
use url::Url;

// * Canonicalizes a URL so that equivalent links collapse to one string.
// *
// * Logic:
// * 1. Parse (unparseable input is passed through untouched).
// * 2. Strip Fragment (#).
// * 3. Right-strip trailing slashes from the path (root stays "/").
// * 4. Group query values by key, in first-appearance order.
// * 5. Remove tracking parameters (case-insensitive key match).
// * 6. Re-encode the remaining parameters.

// * Tracking parameters to strip
// ! CRITICAL: keys are compared lowercased, keep this list lowercase.
pub const TRACKING_PARAMS: &[&str] = &[
    "ref",
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "sessionid",
    "token",
];

// * Path patterns that make a URL inadmissible for crawling
pub const EXCLUDED_PATH_PATTERNS: &[&str] = &[
    // * Auth flows
    r"/login",
    r"/signin",
    r"/signup",
    r"/register",
    // * Commerce / checkout
    r"/cart",
    r"/checkout",
    r"/basket",
    r"/buy",
    // * Legal / compliance
    r"/privacy",
    r"/terms",
    r"/cookie",
    r"/gdpr",
    r"/legal",
    // * Sales funnels
    r"/pricing",
    r"/plans",
    r"/subscribe",
    // * Account / admin surfaces
    r"/account",
    r"/settings",
    r"/profile",
    r"/dashboard",
    r"/admin",
    r"/cms",
    r"/wp-admin",
    // * Well-known non-content files
    r"/sitemap\.xml",
    r"/robots\.txt",
];

static EXCLUDED_PATHS: LazyLock<RegexSet> =
    LazyLock::new(|| RegexSet::new(EXCLUDED_PATH_PATTERNS).unwrap());

pub fn canonicalize(raw: &str) -> String {
    let mut url = match Url::parse(raw) {
        Ok(u) => u,
        Err(e) => {
            warn!(url = raw, error = %e, "URL failed to parse, passing through unchanged");
            return raw.to_string();
        }
    };

    url.set_fragment(None);

    // * Trailing slash: "/page/" -> "/page", "/" and "//" -> "/"
    // * Opaque paths (mailto:, data:, ...) are left as parsed
    if !url.cannot_be_a_base() {
        let trimmed = url.path().trim_end_matches('/').to_string();
        if trimmed.is_empty() {
            url.set_path("/");
        } else if trimmed.len() != url.path().len() {
            url.set_path(&trimmed);
        }
    }

    let params = filter_query(&url);
    if params.is_empty() {
        url.set_query(None);
    } else {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, values) in &params {
            for value in values {
                serializer.append_pair(key, value);
            }
        }
        let encoded = serializer.finish();
        url.set_query(Some(&encoded));
    }

    url.to_string()
}

// * Groups query pairs by key while preserving the order keys first appear in.
// * Blank values are dropped.
fn filter_query(url: &Url) -> Vec<(String, Vec<String>)> {
    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();

    for (key, value) in url.query_pairs() {
        if value.is_empty() || is_tracking_param(&key) {
            continue;
        }
        match grouped.iter_mut().find(|(k, _)| k.as_str() == key.as_ref()) {
            Some((_, values)) => values.push(value.into_owned()),
            None => grouped.push((key.into_owned(), vec![value.into_owned()])),
        }
    }

    grouped
}

fn is_tracking_param(key: &str) -> bool {
    let lower = key.to_lowercase();
    TRACKING_PARAMS.contains(&lower.as_str())
}

// * Advisory admissibility check against the fixed exclusion list.
pub fn is_excluded(raw: &str) -> bool {
    let path = match Url::parse(raw) {
        Ok(u) => u.path().to_lowercase(),
        // ? Unparseable: test everything before the query/fragment
        Err(_) => raw
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_lowercase(),
    };

    EXCLUDED_PATHS.is_match(&path)
}

// * Caller-supplied include/exclude overrides, layered on top of the fixed list.
#[derive(Debug, Clone, Default)]
pub struct UrlFilter {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl UrlFilter {
    // * Compiles override patterns; the first invalid pattern is reported
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self, regex::Error> {
        let include = include
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        let exclude = exclude
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { include, exclude })
    }

    // * True when the canonical URL must not be fetched
    pub fn rejects(&self, canonical_url: &str) -> bool {
        if is_excluded(canonical_url) {
            return true;
        }

        if self.exclude.iter().any(|p| p.is_match(canonical_url)) {
            return true;
        }

        !self.include.is_empty() && !self.include.iter().any(|p| p.is_match(canonical_url))
    }
}
