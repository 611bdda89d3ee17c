//! Reporters that do not own a sink of their own

use crate::graph::{Action, CrawlGraph, PageState};
use crate::output::traits::{CrawlReporter, OutputResult, PageVisit};

/// Reports crawl events through `tracing`
///
/// This is the engine's default reporter.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl CrawlReporter for LogReporter {
    fn on_page_visited(&self, visit: &PageVisit) -> OutputResult<()> {
        tracing::debug!(
            "Page {} ({}): \"{}\" after {} attempt(s) in {}ms",
            visit.page_id,
            visit.url,
            visit.title,
            visit.attempts,
            visit.load_time_ms
        );
        Ok(())
    }

    fn on_page_failed(&self, url: &str, reason: &str) -> OutputResult<()> {
        tracing::warn!("Failed to visit {}: {}", url, reason);
        Ok(())
    }

    fn on_progress(&self, graph: &CrawlGraph) -> OutputResult<()> {
        tracing::info!(
            "Graph: {} pages, {} states, {} edges, {} failures",
            graph.page_count(),
            graph.state_count(),
            graph.edge_count(),
            graph.failures().len()
        );
        Ok(())
    }

    fn on_state_recorded(&self, state: &PageState, via: Option<&Action>) -> OutputResult<()> {
        match via {
            Some(action) => tracing::debug!(
                "{} reached by {} in {}ms",
                state.state_id,
                action.decision,
                action.duration_ms
            ),
            None => tracing::debug!("{} is the initial state", state.state_id),
        }
        Ok(())
    }
}

/// Forwards every event to several reporters
///
/// All reporters see every event, even when an earlier one fails; the first
/// error is returned.
pub struct FanoutReporter {
    reporters: Vec<Box<dyn CrawlReporter>>,
}

impl FanoutReporter {
    pub fn new(reporters: Vec<Box<dyn CrawlReporter>>) -> Self {
        Self { reporters }
    }

    fn each<F>(&self, mut f: F) -> OutputResult<()>
    where
        F: FnMut(&dyn CrawlReporter) -> OutputResult<()>,
    {
        let mut first_error = None;
        for reporter in &self.reporters {
            if let Err(e) = f(reporter.as_ref()) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl CrawlReporter for FanoutReporter {
    fn on_page_visited(&self, visit: &PageVisit) -> OutputResult<()> {
        self.each(|r| r.on_page_visited(visit))
    }

    fn on_page_failed(&self, url: &str, reason: &str) -> OutputResult<()> {
        self.each(|r| r.on_page_failed(url, reason))
    }

    fn on_progress(&self, graph: &CrawlGraph) -> OutputResult<()> {
        self.each(|r| r.on_progress(graph))
    }

    fn on_state_recorded(&self, state: &PageState, via: Option<&Action>) -> OutputResult<()> {
        self.each(|r| r.on_state_recorded(state, via))
    }
}
