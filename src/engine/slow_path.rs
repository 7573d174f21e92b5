// * Slow Path - Headless Browser Rendering
// * Uses ChromiumOxide for JavaScript-heavy pages. Honours every field of the FetchStrategy.

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::SetCacheDisabledParams;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::engine::strategy::{FetchStrategy, WaitCondition};
use crate::network::errors::FetchError;
use crate::network::fetcher::{html_to_markdown, FetchFuture, PageFetcher, RawPage};

// * Stealth payload to mask WebDriver detection
const STEALTH_PAYLOAD: &str = r#"
(() => {
    Object.defineProperty(navigator, 'webdriver', {
        get: () => undefined,
        configurable: true
    });

    Object.defineProperty(navigator, 'plugins', {
        get: () => {
            const plugins = [
                { name: 'Chrome PDF Plugin', filename: 'internal-pdf-viewer' },
                { name: 'Chrome PDF Viewer', filename: 'mhjfbmdgcfjbbpaeojofohoefgiehjai' },
                { name: 'Native Client', filename: 'internal-nacl-plugin' }
            ];
            plugins.item = (i) => plugins[i];
            plugins.namedItem = (name) => plugins.find(p => p.name === name);
            plugins.refresh = () => {};
            return plugins;
        },
        configurable: true
    });

    Object.defineProperty(navigator, 'languages', {
        get: () => ['en-US', 'en'],
        configurable: true
    });

    Object.defineProperty(navigator, 'hardwareConcurrency', {
        get: () => 4,
        configurable: true
    });

    const originalQuery = window.navigator.permissions.query;
    window.navigator.permissions.query = (parameters) => (
        parameters.name === 'notifications' ?
            Promise.resolve({ state: Notification.permission }) :
            originalQuery(parameters)
    );
})();
"#;

// * Strips cookie banners, consent dialogs and modal backdrops that hide content
const OVERLAY_REMOVAL_JS: &str = r#"
(() => {
    const selectors = [
        '[id*="cookie"]', '[class*="cookie"]',
        '[id*="consent"]', '[class*="consent"]',
        '[class*="modal-backdrop"]', '[class*="overlay"]',
        '[role="dialog"][aria-modal="true"]'
    ];
    let removed = 0;
    for (const sel of selectors) {
        document.querySelectorAll(sel).forEach(el => { el.remove(); removed++; });
    }
    document.documentElement.style.overflow = 'auto';
    if (document.body) document.body.style.overflow = 'auto';
    return removed;
})()
"#;

const READY_STATE_JS: &str = "document.readyState";

// * Poll cadence for render conditions evaluated in the page
const POLL_INTERVAL: Duration = Duration::from_millis(250);

// * Settle time after readyState=complete, standing in for network idle
const NETWORK_IDLE_SETTLE: Duration = Duration::from_millis(500);

// * Upper bound on how long a wait_for_selector may hold up capture
const SELECTOR_WAIT_CAP: Duration = Duration::from_secs(10);

struct BrowserState {
    browser: Browser,
    handler: JoinHandle<()>,
}

// * BrowserFetcher manages one shared headless browser, one tab per fetch
pub struct BrowserFetcher {
    state: Mutex<Option<BrowserState>>,
}

impl BrowserFetcher {
    // * Creates a new fetcher (browser not launched until needed)
    pub fn new() -> Self {
        Self {
            state: Mutex::new(None),
        }
    }

    async fn launch() -> Result<BrowserState, FetchError> {
        let config = BrowserConfig::builder()
            .no_sandbox()
            .viewport(None)
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .build()
            .map_err(FetchError::BrowserLaunch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| FetchError::BrowserLaunch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "Browser handler event error");
                }
            }
        });

        info!("BrowserFetcher browser launched");
        Ok(BrowserState { browser, handler })
    }

    // * Opens a fresh tab, launching the browser on first use
    async fn open_page(&self) -> Result<Page, FetchError> {
        let mut guard = self.state.lock().await;
        if guard.is_none() {
            *guard = Some(Self::launch().await?);
        }

        match guard.as_ref() {
            Some(state) => state
                .browser
                .new_page("about:blank")
                .await
                .map_err(|e| FetchError::Navigation(e.to_string())),
            None => Err(FetchError::BrowserLaunch("browser unavailable".to_string())),
        }
    }

    // * Renders a page according to the strategy and returns it as markdown
    pub async fn render(&self, url: &str, strategy: &FetchStrategy) -> Result<RawPage, FetchError> {
        let tab = OpenTab::new(self.open_page().await?);
        let result = tokio::time::timeout(strategy.page_timeout(), Self::render_in(tab.page(), url, strategy)).await;
        tab.close().await;

        match result {
            Ok(outcome) => outcome,
            Err(_) => Err(FetchError::Timeout(strategy.page_timeout_ms)),
        }
    }

    async fn render_in(page: &Page, url: &str, strategy: &FetchStrategy) -> Result<RawPage, FetchError> {
        if strategy.anti_bot {
            page.evaluate_on_new_document(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_PAYLOAD))
                .await
                .map_err(|e| FetchError::ScriptInjection(e.to_string()))?;
        }

        if strategy.bypass_cache {
            page.execute(SetCacheDisabledParams::new(true))
                .await
                .map_err(|e| FetchError::Navigation(e.to_string()))?;
        }

        page.goto(url)
            .await
            .map_err(|e| FetchError::Navigation(e.to_string()))?;

        wait_for_condition(page, strategy.wait_until).await?;

        if let Some(selector) = strategy.wait_for_selector.as_deref() {
            // ? Best effort: pages without the selector are still captured
            if tokio::time::timeout(SELECTOR_WAIT_CAP, poll_for_element(page, selector))
                .await
                .is_err()
            {
                debug!(url, selector, "Selector did not appear, capturing anyway");
            }
        }

        let delay = strategy.post_render_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if strategy.remove_overlays {
            if let Err(e) = page.evaluate(OVERLAY_REMOVAL_JS).await {
                warn!(url, error = %e, "Overlay removal script failed");
            }
        }

        let final_url = page
            .url()
            .await
            .map_err(|e| FetchError::ContentExtraction(e.to_string()))?
            .unwrap_or_else(|| url.to_string());

        let html = page
            .content()
            .await
            .map_err(|e| FetchError::ContentExtraction(e.to_string()))?;

        let title = page
            .get_title()
            .await
            .map_err(|e| FetchError::ContentExtraction(e.to_string()))?
            .unwrap_or_default();

        let markdown = html_to_markdown(&html)?;
        debug!(url = %final_url, bytes = html.len(), "Slow path render complete");

        Ok(RawPage::ok(final_url, title.trim(), markdown, Some(html)))
    }

    // * Closes the browser gracefully
    pub async fn shutdown(&self) {
        if let Some(mut state) = self.state.lock().await.take() {
            if let Err(e) = state.browser.close().await {
                warn!(error = %e, "Browser close failed");
            }
            state.handler.abort();
        }
        info!("BrowserFetcher shutdown complete");
    }
}

impl Default for BrowserFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BrowserFetcher {
    fn drop(&mut self) {
        // * Can't await in drop; abort the handler and let the child process die with it
        if let Some(state) = self.state.get_mut().take() {
            state.handler.abort();
        }
    }
}

// * Owns one tab. Dropping it unclosed (timeout, batch abort) closes the tab in the background.
struct OpenTab {
    page: Page,
    closed: bool,
}

impl OpenTab {
    fn new(page: Page) -> Self {
        Self { page, closed: false }
    }

    fn page(&self) -> &Page {
        &self.page
    }

    async fn close(mut self) {
        if let Err(e) = self.page.clone().close().await {
            debug!(error = %e, "Failed to close tab");
        }
        self.closed = true;
    }
}

impl Drop for OpenTab {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let page = self.page.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Err(e) = page.close().await {
                        debug!(error = %e, "Failed to close abandoned tab");
                    }
                });
            }
            Err(_) => warn!("No runtime to close abandoned tab"),
        }
    }
}

impl PageFetcher for BrowserFetcher {
    fn fetch<'a>(&'a self, url: &'a str, strategy: &'a FetchStrategy) -> FetchFuture<'a> {
        Box::pin(self.render(url, strategy))
    }
}

async fn wait_for_condition(page: &Page, condition: WaitCondition) -> Result<(), FetchError> {
    match condition {
        WaitCondition::DomContentLoaded => {
            page.wait_for_navigation()
                .await
                .map_err(|e| FetchError::Navigation(e.to_string()))?;
        }
        WaitCondition::NetworkIdle => {
            page.wait_for_navigation()
                .await
                .map_err(|e| FetchError::Navigation(e.to_string()))?;
            poll_ready_state(page).await;
            tokio::time::sleep(NETWORK_IDLE_SETTLE).await;
        }
        WaitCondition::BodyVisible => poll_for_element(page, "body").await,
    }
    Ok(())
}

// * Polls until document.readyState reports complete. Bounded by the caller's timeout.
async fn poll_ready_state(page: &Page) {
    loop {
        if let Ok(result) = page.evaluate(READY_STATE_JS).await {
            if result.into_value::<String>().is_ok_and(|s| s == "complete") {
                return;
            }
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

// * Polls until the selector matches. Bounded by the caller's timeout.
async fn poll_for_element(page: &Page, selector: &str) {
    while page.find_element(selector).await.is_err() {
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stealth_payload_contains_required_masks() {
        assert!(STEALTH_PAYLOAD.contains("webdriver"));
        assert!(STEALTH_PAYLOAD.contains("plugins"));
        assert!(STEALTH_PAYLOAD.contains("languages"));
        assert!(STEALTH_PAYLOAD.contains("hardwareConcurrency"));
    }

    #[test]
    fn test_overlay_script_targets_consent_banners() {
        assert!(OVERLAY_REMOVAL_JS.contains("cookie"));
        assert!(OVERLAY_REMOVAL_JS.contains("consent"));
        assert!(OVERLAY_REMOVAL_JS.contains("overflow"));
    }

    #[tokio::test]
    async fn test_shutdown_without_launch_is_noop() {
        let fetcher = BrowserFetcher::new();
        fetcher.shutdown().await;
        assert!(fetcher.state.lock().await.is_none());
    }
}
