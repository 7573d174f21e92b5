// * Fetch Strategy Selector
// * Table-driven mapping from SiteType to the render configuration handed to the fetcher.
// * Pure lookup plus request overrides; never performs I/O and never fails.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::constants::{DEFAULT_REQUEST_TIMEOUT_SECS, QUICK_PROBE_TIMEOUT_MS};
use crate::engine::classifier::SiteType;

/// Render condition the fetcher waits for before capturing content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WaitCondition {
    NetworkIdle,
    DomContentLoaded,
    BodyVisible,
}

/// Immutable per-request fetch configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchStrategy {
    pub wait_until: WaitCondition,
    pub wait_for_selector: Option<String>,
    /// Seconds to wait after the render condition is met
    pub post_render_delay: f64,
    pub page_timeout_ms: u64,
    pub anti_bot: bool,
    pub remove_overlays: bool,
    pub bypass_cache: bool,
    pub wait_for_js: bool,
}

impl FetchStrategy {
    /// Configuration for the short classification fetch
    pub fn quick_probe() -> Self {
        Self {
            wait_until: WaitCondition::DomContentLoaded,
            wait_for_selector: None,
            post_render_delay: 0.0,
            page_timeout_ms: QUICK_PROBE_TIMEOUT_MS,
            anti_bot: false,
            remove_overlays: false,
            bypass_cache: true,
            wait_for_js: false,
        }
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_millis(self.page_timeout_ms)
    }

    pub fn post_render_delay(&self) -> Duration {
        Duration::from_secs_f64(self.post_render_delay.max(0.0))
    }
}

/// Caller-controlled knobs that feed into strategy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyParams {
    pub timeout_secs: u64,
    pub bypass_cache: bool,
    pub wait_for_js: bool,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            bypass_cache: true,
            wait_for_js: true,
        }
    }
}

// * Render settings that vary by site type
struct RenderProfile {
    wait_until: WaitCondition,
    wait_for_selector: Option<&'static str>,
    post_render_delay: f64,
}

static STRATEGY_TABLE: &[(SiteType, RenderProfile)] = &[
    // * Client-rendered apps need a longer settle time
    (
        SiteType::Spa,
        RenderProfile {
            wait_until: WaitCondition::NetworkIdle,
            wait_for_selector: None,
            post_render_delay: 3.0,
        },
    ),
    (
        SiteType::Documentation,
        RenderProfile {
            wait_until: WaitCondition::DomContentLoaded,
            wait_for_selector: None,
            post_render_delay: 0.0,
        },
    ),
    (
        SiteType::Article,
        RenderProfile {
            wait_until: WaitCondition::DomContentLoaded,
            wait_for_selector: Some("article, .article, .post, main"),
            post_render_delay: 0.0,
        },
    ),
];

// * Every site type without a row above
static DEFAULT_PROFILE: RenderProfile = RenderProfile {
    wait_until: WaitCondition::BodyVisible,
    wait_for_selector: None,
    post_render_delay: 1.0,
};

pub fn select_strategy(site_type: SiteType, params: &StrategyParams) -> FetchStrategy {
    let row = STRATEGY_TABLE
        .iter()
        .find(|(row_type, _)| *row_type == site_type)
        .map_or(&DEFAULT_PROFILE, |(_, profile)| profile);

    FetchStrategy {
        wait_until: row.wait_until,
        wait_for_selector: row.wait_for_selector.map(str::to_string),
        post_render_delay: row.post_render_delay,
        page_timeout_ms: params.timeout_secs.max(1).saturating_mul(1000),
        anti_bot: true,
        remove_overlays: true,
        bypass_cache: params.bypass_cache,
        wait_for_js: params.wait_for_js,
    }
}
