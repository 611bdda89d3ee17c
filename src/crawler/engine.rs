//! Crawl orchestration
//!
//! The engine drives a single page driver through one of two modes:
//!
//! - **BFS**: breadth-first link discovery from a start URL, bounded by depth
//! - **Interactive**: a single line of actions chosen by a decision maker,
//!   recorded as page states joined by edges
//!
//! Both modes share one visitor (retry policy) and one scanner (element ids
//! persist across the engine's lifetime). Failures never abort a crawl: a
//! page that cannot be visited is skipped and recorded, and a failed action
//! ends the interactive line without recording anything.

use crate::config::CrawlerConfig;
use crate::crawler::notify;
use crate::crawler::scanner::ElementScanner;
use crate::crawler::visitor::{PageVisitor, VisitError};
use crate::decision::DecisionMaker;
use crate::driver::{scripts, DriverError, ElementHandle, PageDriver, ScrollPosition, WindowSize};
use crate::graph::{
    page_id_for, Action, ActionDecision, CrawlGraph, Edge, ElementSummary, GraphError, Page,
    PageMetadata, PageState, Screenshot, ScrollTarget,
};
use crate::output::{CrawlReporter, LogReporter, PageVisit};
use crate::storage::CrawlRepository;
use crate::url::{normalize_url, same_domain};
use chrono::Utc;
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// A URL waiting in the BFS frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: String,
    pub depth: u32,
    /// Page the URL was discovered on (None for the start URL)
    pub referrer: Option<String>,
}

/// Why an interactive exploration ended
#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    /// The start URL could not be visited or captured
    StartFailed { reason: String },
    /// The decision maker proposed no further action
    DecisionMakerStopped,
    /// Executing an action failed; nothing was recorded for it
    ActionFailed {
        state_id: String,
        action: ActionDecision,
        error: String,
    },
    /// The decision maker declined to continue after a new state
    ExplorationDeclined,
}

/// Result of an interactive exploration
#[derive(Debug, Clone)]
pub struct Exploration {
    pub graph: CrawlGraph,
    pub stop_reason: StopReason,
}

/// Errors executing a single action
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Unknown element {0}")]
    UnknownElement(String),

    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("{0}")]
    Visit(#[from] VisitError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),
}

/// Crawl engine over a single page driver
pub struct CrawlEngine<D: PageDriver> {
    driver: D,
    config: CrawlerConfig,
    visitor: PageVisitor,
    scanner: ElementScanner,
    reporter: Arc<dyn CrawlReporter>,
    repository: Option<Box<dyn CrawlRepository>>,
    screenshot_dir: Option<PathBuf>,
}

impl<D: PageDriver> CrawlEngine<D> {
    pub fn new(driver: D, config: &CrawlerConfig) -> Self {
        Self {
            driver,
            config: config.clone(),
            visitor: PageVisitor::new(config),
            scanner: ElementScanner::new(config),
            reporter: Arc::new(LogReporter),
            repository: None,
            screenshot_dir: None,
        }
    }

    /// Replaces the default log reporter
    pub fn with_reporter(mut self, reporter: Arc<dyn CrawlReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Persists pages as they are captured and graphs at checkpoints
    pub fn with_repository(mut self, repository: Box<dyn CrawlRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Captures viewport screenshots of each new page into `dir`
    pub fn with_screenshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.screenshot_dir = Some(dir.into());
        self
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Breadth-first page discovery from `start_url`
    ///
    /// Visits every page within `max_depth` link hops of the start URL
    /// exactly once. Pages that cannot be visited are recorded as failures
    /// and skipped. The graph is saved every `checkpoint_interval` pages
    /// and once more at the end.
    pub async fn crawl_bfs(&mut self, start_url: &str) -> CrawlGraph {
        let mut graph = CrawlGraph::new(start_url);
        let start = match normalize_url(start_url) {
            Ok(url) => url.to_string(),
            Err(e) => {
                tracing::error!("Invalid start URL {}: {}", start_url, e);
                graph.record_failure(start_url, &e.to_string());
                notify(self.reporter.on_page_failed(start_url, &e.to_string()));
                return graph;
            }
        };

        tracing::info!(
            "Starting BFS crawl from {} (max depth {})",
            start,
            self.config.max_depth
        );

        let mut frontier = VecDeque::from([FrontierEntry {
            url: start.clone(),
            depth: 0,
            referrer: None,
        }]);
        let mut visited: HashSet<String> = HashSet::new();
        let mut pages_visited: u32 = 0;

        while let Some(entry) = frontier.pop_front() {
            if visited.contains(&entry.url) {
                if let Some(referrer) = &entry.referrer {
                    graph.add_referrer(&entry.url, referrer);
                }
                tracing::trace!("Already visited {}", entry.url);
                continue;
            }
            visited.insert(entry.url.clone());

            tracing::debug!(
                "Processing {} (depth {}, {} queued)",
                entry.url,
                entry.depth,
                frontier.len()
            );

            let report = match self
                .visitor
                .visit(&mut self.driver, &entry.url, self.reporter.as_ref())
                .await
            {
                Ok(report) => report,
                Err(e) => {
                    graph.record_failure(e.url(), &e.reason());
                    continue;
                }
            };

            let page = self
                .capture_page(entry.url.clone(), report.load_time, true)
                .await;

            for link in &page.links {
                graph.add_referrer(link, &entry.url);
            }

            if entry.depth < self.config.max_depth {
                for link in &page.links {
                    if visited.contains(link) {
                        continue;
                    }
                    if self.config.stay_on_domain && !same_domain(link, &start) {
                        tracing::trace!("Not following off-domain link {}", link);
                        continue;
                    }
                    frontier.push_back(FrontierEntry {
                        url: link.clone(),
                        depth: entry.depth + 1,
                        referrer: Some(entry.url.clone()),
                    });
                }
            }

            tracing::info!(
                "Visited {} (depth {}, {} elements, {} links)",
                entry.url,
                entry.depth,
                page.interactive_elements.len(),
                page.links.len()
            );
            notify(self.reporter.on_page_visited(&PageVisit {
                url: entry.url.clone(),
                page_id: page.page_id.clone(),
                title: page.title().to_string(),
                depth: Some(entry.depth),
                referrer: entry.referrer.clone(),
                attempts: report.attempts,
                load_time_ms: report.load_time.as_millis() as u64,
                element_count: page.interactive_elements.len(),
                link_count: page.links.len(),
            }));

            self.persist_page(&page);
            graph.add_page(page);

            pages_visited += 1;
            if pages_visited % self.config.checkpoint_interval.max(1) == 0 {
                tracing::info!(
                    "Progress: {} pages visited, {} queued, {} failed",
                    pages_visited,
                    frontier.len(),
                    graph.failures().len()
                );
                notify(self.reporter.on_progress(&graph));
                self.save_graph(&graph);
            }
        }

        tracing::info!(
            "BFS crawl complete: {} pages, {} failures",
            graph.page_count(),
            graph.failures().len()
        );
        notify(self.reporter.on_progress(&graph));
        self.save_graph(&graph);
        graph
    }

    /// Decision-driven exploration from `start_url`
    ///
    /// Records an initial state for the start page, then repeatedly asks the
    /// decision maker for an action, executes it and records the resulting
    /// state and the edge leading to it. Repeating an action always creates
    /// a new state; there is no cycle detection.
    pub async fn explore(
        &mut self,
        start_url: &str,
        decision_maker: &mut dyn DecisionMaker,
    ) -> Exploration {
        let mut graph = CrawlGraph::new(start_url);
        let stop_reason = self.run_exploration(&mut graph, start_url, decision_maker).await;

        tracing::info!(
            "Exploration finished ({:?}): {} states, {} edges",
            stop_reason,
            graph.state_count(),
            graph.edge_count()
        );
        notify(self.reporter.on_progress(&graph));
        self.save_graph(&graph);

        Exploration { graph, stop_reason }
    }

    async fn run_exploration(
        &mut self,
        graph: &mut CrawlGraph,
        start_url: &str,
        decision_maker: &mut dyn DecisionMaker,
    ) -> StopReason {
        let start = match normalize_url(start_url) {
            Ok(url) => url.to_string(),
            Err(e) => {
                graph.record_failure(start_url, &e.to_string());
                notify(self.reporter.on_page_failed(start_url, &e.to_string()));
                return StopReason::StartFailed {
                    reason: e.to_string(),
                };
            }
        };

        let report = match self
            .visitor
            .visit(&mut self.driver, &start, self.reporter.as_ref())
            .await
        {
            Ok(report) => report,
            Err(e) => {
                graph.record_failure(e.url(), &e.reason());
                return StopReason::StartFailed {
                    reason: e.reason(),
                };
            }
        };

        let mut current = match self
            .record_state(graph, report.load_time, Vec::new(), None)
            .await
        {
            Ok(state) => state,
            Err(e) => {
                tracing::error!("Failed to record initial state: {}", e);
                return StopReason::StartFailed {
                    reason: e.to_string(),
                };
            }
        };

        loop {
            let Some(decision) = decision_maker.decide_next_action(&current) else {
                return StopReason::DecisionMakerStopped;
            };

            tracing::info!("Executing {} from {}", decision, current.state_id);
            let started = Instant::now();

            if let Err(e) = self.execute(&decision).await {
                tracing::warn!("Action {} failed: {}", decision, e);
                return StopReason::ActionFailed {
                    state_id: current.state_id.clone(),
                    action: decision,
                    error: e.to_string(),
                };
            }

            let action_id = graph.next_action_id();
            let action = Action::completed(
                action_id,
                decision,
                started.elapsed().as_millis() as u64,
            );
            let mut history = current.action_history.clone();
            history.push(action.clone());

            let next = match self
                .record_state(graph, started.elapsed(), history, Some(&action))
                .await
            {
                Ok(state) => state,
                Err(e) => {
                    tracing::error!("Failed to record state after {}: {}", action.decision, e);
                    return StopReason::ActionFailed {
                        state_id: current.state_id.clone(),
                        action: action.decision,
                        error: e.to_string(),
                    };
                }
            };

            let edge = Edge::new(current.state_id.clone(), next.state_id.clone(), action);
            if let Err(e) = graph.add_edge(edge) {
                tracing::error!("Failed to record edge into {}: {}", next.state_id, e);
            }
            current = next;

            if !decision_maker.should_continue_exploration(&current) {
                return StopReason::ExplorationDeclined;
            }
        }
    }

    /// Runs one action and waits for the page to settle
    async fn execute(&mut self, decision: &ActionDecision) -> Result<(), ActionError> {
        match decision {
            ActionDecision::Click { element_id } => {
                let handle = self.resolve(element_id)?;
                self.driver.click(&handle).await?;
            }
            ActionDecision::Input { element_id, value } => {
                let handle = self.resolve(element_id)?;
                self.driver.send_keys(&handle, value).await?;
            }
            ActionDecision::Hover { element_id } => {
                let handle = self.resolve(element_id)?;
                self.driver.hover(&handle).await?;
            }
            ActionDecision::Scroll { target } => {
                let position = match target {
                    ScrollTarget::Position(px) => ScrollPosition::Offset(*px),
                    ScrollTarget::Element(element_id) => {
                        ScrollPosition::Element(self.resolve(element_id)?)
                    }
                };
                self.driver.scroll_to(&position).await?;
            }
            ActionDecision::Navigate { url } => {
                self.visitor
                    .visit(&mut self.driver, url, self.reporter.as_ref())
                    .await?;
            }
        }

        tokio::time::sleep(self.config.action_settle()).await;
        self.driver
            .wait_document_ready(self.config.page_load_timeout())
            .await?;
        Ok(())
    }

    fn resolve(&self, element_id: &str) -> Result<ElementHandle, ActionError> {
        self.scanner
            .handle_for(element_id)
            .cloned()
            .ok_or_else(|| ActionError::UnknownElement(element_id.to_string()))
    }

    /// Captures the current page into a new state
    ///
    /// Adds a page to the graph if the current URL has not been seen.
    async fn record_state(
        &mut self,
        graph: &mut CrawlGraph,
        load_time: Duration,
        action_history: Vec<Action>,
        via: Option<&Action>,
    ) -> Result<PageState, ActionError> {
        let url = self.driver.current_url().await?;
        let scroll_position = self.script_number(scripts::SCROLL_OFFSET).await.unwrap_or(0);
        let is_new_page = graph.page(&page_id_for(&url)).is_none();

        let page = self.capture_page(url.clone(), load_time, is_new_page).await;

        // The scan scrolls through the page; put the viewport back where the action left it
        if scroll_position != 0 {
            if let Err(e) = self
                .driver
                .scroll_to(&ScrollPosition::Offset(scroll_position))
                .await
            {
                tracing::debug!("Failed to restore scroll position: {}", e);
            }
        }
        let form_values = self.scanner.form_values(&mut self.driver).await;

        let state = PageState {
            state_id: graph.next_state_id(),
            page_id: page.page_id.clone(),
            url: url.clone(),
            title: page.title().to_string(),
            timestamp: Utc::now(),
            scroll_position,
            form_values,
            elements: page
                .interactive_elements
                .iter()
                .map(ElementSummary::from)
                .collect(),
            action_history,
        };

        if is_new_page {
            graph.add_page_with_state(page.clone(), state.clone())?;
            notify(self.reporter.on_page_visited(&PageVisit {
                url: url.clone(),
                page_id: page.page_id.clone(),
                title: page.title().to_string(),
                depth: None,
                referrer: None,
                attempts: 1,
                load_time_ms: load_time.as_millis() as u64,
                element_count: page.interactive_elements.len(),
                link_count: page.links.len(),
            }));
            self.persist_page(&page);
        } else {
            graph.add_state(state.clone())?;
        }

        tracing::info!(
            "Recorded {} at {} ({} elements)",
            state.state_id,
            state.url,
            state.elements.len()
        );
        notify(self.reporter.on_state_recorded(&state, via));
        Ok(state)
    }

    /// Builds a page record for the document currently loaded
    async fn capture_page(
        &mut self,
        url: String,
        load_time: Duration,
        with_screenshots: bool,
    ) -> Page {
        let title = match self.driver.title().await {
            Ok(title) => title,
            Err(e) => {
                tracing::warn!("Failed to read title of {}: {}", url, e);
                String::new()
            }
        };

        let scan = self.scanner.scan(&mut self.driver).await;
        let links = self.scanner.extract_links(&mut self.driver).await;

        let window = match self.driver.window_size().await {
            Ok(window) => window,
            Err(e) => {
                tracing::debug!("Window size unavailable: {}", e);
                WindowSize {
                    width: 1280,
                    height: 800,
                }
            }
        };
        let total_height = self
            .script_number(scripts::DOCUMENT_HEIGHT)
            .await
            .map_or(window.height, |h| h.max(0) as u32);
        let total_width = self
            .script_number(scripts::DOCUMENT_WIDTH)
            .await
            .map_or(window.width, |w| w.max(0) as u32);

        let page_id = page_id_for(&url);
        let screenshots = if with_screenshots {
            self.capture_screenshots(&page_id, total_height, window).await
        } else {
            Vec::new()
        };

        let metadata = PageMetadata {
            url,
            title,
            timestamp: Utc::now(),
            total_width,
            total_height,
            viewport_width: window.width,
            viewport_height: window.height,
            load_time_ms: load_time.as_millis() as u64,
        };

        Page::new(
            metadata,
            screenshots,
            scan.into_values().flatten().collect(),
            links,
        )
    }

    /// Captures one screenshot per viewport-sized section of the page
    async fn capture_screenshots(
        &mut self,
        page_id: &str,
        total_height: u32,
        window: WindowSize,
    ) -> Vec<Screenshot> {
        let Some(dir) = self.screenshot_dir.clone() else {
            return Vec::new();
        };

        let viewport_height = window.height.max(1);
        let sections = total_height.div_ceil(viewport_height).max(1);
        let mut screenshots = Vec::new();

        for section in 1..=sections {
            let offset = i64::from(section - 1) * i64::from(viewport_height);
            if section > 1 {
                if let Err(e) = self.driver.scroll_to(&ScrollPosition::Offset(offset)).await {
                    tracing::debug!("Stopping screenshots of {}: {}", page_id, e);
                    break;
                }
            }

            let screenshot_id = format!("{}_section_{}", page_id, section);
            let path = dir.join(format!("{}.png", screenshot_id));
            match self.driver.capture_screenshot(&path).await {
                Ok(()) => screenshots.push(Screenshot {
                    screenshot_id,
                    path: path.display().to_string(),
                    section_number: section,
                    viewport_width: window.width,
                    viewport_height: window.height,
                    scroll_position: offset,
                }),
                Err(e) if e.is_unsupported() => {
                    tracing::debug!("Driver cannot capture screenshots");
                    break;
                }
                Err(e) => {
                    tracing::warn!("Screenshot {} failed: {}", screenshot_id, e);
                    break;
                }
            }
        }

        if screenshots.len() > 1 {
            if let Err(e) = self.driver.scroll_to(&ScrollPosition::Offset(0)).await {
                tracing::debug!("Failed to scroll back to top: {}", e);
            }
        }
        screenshots
    }

    async fn script_number(&mut self, script: &str) -> Option<i64> {
        match self.driver.execute_script(script, &[]).await {
            Ok(value) => value
                .as_i64()
                .or_else(|| value.as_f64().map(|n| n.round() as i64)),
            Err(e) => {
                tracing::trace!("Script unavailable: {}", e);
                None
            }
        }
    }

    fn persist_page(&self, page: &Page) {
        if let Some(repository) = &self.repository {
            if let Err(e) = repository.save_page(page) {
                tracing::warn!("Failed to save page {}: {}", page.page_id, e);
            }
        }
    }

    fn save_graph(&self, graph: &CrawlGraph) {
        if let Some(repository) = &self.repository {
            match repository.save_graph(graph) {
                Ok(()) => tracing::debug!("Saved graph {}", graph.key()),
                Err(e) => tracing::warn!("Failed to save graph {}: {}", graph.key(), e),
            }
        }
    }
}
