use thiserror::Error;

// * Unified error type for the fetch boundary.
// * Every adapter (HTTP client, headless browser) reports failures through this enum.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Soft Ban detected: {0}")]
    SoftBan(String),

    #[error("HTTP {0} Forbidden/Blocked")]
    HardBan(u16),

    #[error("Empty response body ({0} bytes)")]
    EmptyResponse(usize),

    #[error("Browser launch failed: {0}")]
    BrowserLaunch(String),

    #[error("Page navigation failed: {0}")]
    Navigation(String),

    #[error("Page timeout after {0}ms")]
    Timeout(u64),

    #[error("Script injection failed: {0}")]
    ScriptInjection(String),

    #[error("Content extraction failed: {0}")]
    ContentExtraction(String),

    #[error("Markdown conversion failed: {0}")]
    Conversion(String),

    #[error("Fetcher reported failure: {0}")]
    Unsuccessful(String),
}

impl FetchError {
    // * Timeouts and bans are worth surfacing differently in metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::SoftBan(_) => "soft_ban",
            Self::HardBan(_) => "hard_ban",
            Self::EmptyResponse(_) => "empty",
            Self::BrowserLaunch(_) => "browser_launch",
            Self::Navigation(_) => "navigation",
            Self::Timeout(_) => "timeout",
            Self::ScriptInjection(_) => "script",
            Self::ContentExtraction(_) => "extraction",
            Self::Conversion(_) => "conversion",
            Self::Unsuccessful(_) => "unsuccessful",
        }
    }
}
