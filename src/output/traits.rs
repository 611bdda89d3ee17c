//! Crawl reporter trait and types
//!
//! This module defines the sink the crawl engine notifies as pages are
//! visited, pages fail and states are recorded.

use crate::graph::{Action, CrawlGraph, PageState};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to format output: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Information about a successfully visited page
#[derive(Debug, Clone, PartialEq)]
pub struct PageVisit {
    /// The page URL
    pub url: String,

    /// Page id in the crawl graph
    pub page_id: String,

    /// Page title
    pub title: String,

    /// BFS depth from the start URL (None in interactive mode)
    pub depth: Option<u32>,

    /// Page the visit was reached from
    pub referrer: Option<String>,

    /// Navigation attempts used
    pub attempts: u32,

    /// Time from the successful navigation to document readiness
    pub load_time_ms: u64,

    /// Number of interactive elements found
    pub element_count: usize,

    /// Number of outbound links found
    pub link_count: usize,
}

/// Trait for crawl reporters
///
/// Reporters observe a crawl; they never influence it. The engine logs and
/// ignores reporter errors. Implementations must be thread-safe.
pub trait CrawlReporter: Send + Sync {
    /// Records a successfully visited page
    ///
    /// # Arguments
    ///
    /// * `visit` - Information about the visit
    fn on_page_visited(&self, visit: &PageVisit) -> OutputResult<()>;

    /// Records a page that could not be visited
    ///
    /// # Arguments
    ///
    /// * `url` - The URL that failed
    /// * `reason` - Human-readable failure reason
    fn on_page_failed(&self, url: &str, reason: &str) -> OutputResult<()>;

    /// Records a periodic snapshot of the crawl
    fn on_progress(&self, graph: &CrawlGraph) -> OutputResult<()>;

    /// Records a new state in an interactive exploration
    ///
    /// `via` is the action that produced the state, or `None` for the
    /// initial state.
    fn on_state_recorded(&self, state: &PageState, via: Option<&Action>) -> OutputResult<()> {
        let _ = (state, via);
        Ok(())
    }
}
