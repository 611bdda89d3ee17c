use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub driver: DriverConfig,
    pub output: OutputConfig,
}

/// What to crawl and how
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Seed URL for the exploration
    #[serde(rename = "start-url")]
    pub start_url: String,

    /// Traversal mode
    #[serde(default)]
    pub mode: CrawlMode,

    /// Decision maker used in interactive mode
    #[serde(rename = "decision-maker", default)]
    pub decision_maker: DecisionMakerKind,
}

/// Traversal mode of the crawl engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrawlMode {
    /// Breadth-first link discovery
    #[default]
    Bfs,
    /// Decision-driven exploration of a single line of actions
    Interactive,
}

/// Which decision maker drives interactive mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecisionMakerKind {
    /// Prompt on the console
    #[default]
    Human,
    /// Click every link once
    Links,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum BFS depth from the start URL
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// Navigation attempts per page visit
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay between timed-out attempts (milliseconds)
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Bound on waiting for document readiness (milliseconds)
    #[serde(rename = "page-load-timeout-ms", default = "default_page_load_timeout_ms")]
    pub page_load_timeout_ms: u64,

    /// Wait after each scroll-to-bottom while materializing content (milliseconds)
    #[serde(rename = "scroll-settle-ms", default = "default_scroll_settle_ms")]
    pub scroll_settle_ms: u64,

    /// Wait after executing an interactive action (milliseconds)
    #[serde(rename = "action-settle-ms", default = "default_action_settle_ms")]
    pub action_settle_ms: u64,

    /// Upper bound on scroll-to-bottom rounds per scan
    #[serde(rename = "max-scroll-rounds", default = "default_max_scroll_rounds")]
    pub max_scroll_rounds: u32,

    /// Pages between progress reports and graph checkpoints
    #[serde(rename = "checkpoint-interval", default = "default_checkpoint_interval")]
    pub checkpoint_interval: u32,

    /// Only follow links on the start URL's host
    #[serde(rename = "stay-on-domain", default = "default_stay_on_domain")]
    pub stay_on_domain: bool,
}

impl CrawlerConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_millis(self.page_load_timeout_ms)
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }

    pub fn action_settle(&self) -> Duration {
        Duration::from_millis(self.action_settle_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            page_load_timeout_ms: default_page_load_timeout_ms(),
            scroll_settle_ms: default_scroll_settle_ms(),
            action_settle_ms: default_action_settle_ms(),
            max_scroll_rounds: default_max_scroll_rounds(),
            checkpoint_interval: default_checkpoint_interval(),
            stay_on_domain: default_stay_on_domain(),
        }
    }
}

/// Page driver configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DriverConfig {
    /// User agent sent by the HTTP driver
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout for the HTTP driver (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Initial viewport width in pixels
    #[serde(rename = "viewport-width", default = "default_viewport_width")]
    pub viewport_width: u32,

    /// Initial viewport height in pixels
    #[serde(rename = "viewport-height", default = "default_viewport_height")]
    pub viewport_height: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory holding page and graph documents
    #[serde(rename = "data-dir")]
    pub data_dir: String,

    /// Path of the markdown crawl log
    #[serde(rename = "log-path")]
    pub log_path: String,

    /// Capture one screenshot per visited page
    #[serde(rename = "capture-screenshots", default)]
    pub capture_screenshots: bool,
}

fn default_max_depth() -> u32 {
    2
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_page_load_timeout_ms() -> u64 {
    5000
}

fn default_scroll_settle_ms() -> u64 {
    2000
}

fn default_action_settle_ms() -> u64 {
    1000
}

fn default_max_scroll_rounds() -> u32 {
    20
}

fn default_checkpoint_interval() -> u32 {
    10
}

fn default_stay_on_domain() -> bool {
    false
}

fn default_user_agent() -> String {
    format!("ui-cartographer/{}", env!("CARGO_PKG_VERSION"))
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_viewport_width() -> u32 {
    1280
}

fn default_viewport_height() -> u32 {
    800
}
