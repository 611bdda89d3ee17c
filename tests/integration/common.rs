//! Shared helpers for integration tests

use std::sync::Mutex;
use ui_cartographer::config::CrawlerConfig;
use ui_cartographer::graph::{Action, CrawlGraph, PageState};
use ui_cartographer::output::{CrawlReporter, OutputResult, PageVisit};

/// Crawler settings with every wait removed
pub fn fast_config() -> CrawlerConfig {
    CrawlerConfig {
        retry_delay_ms: 0,
        scroll_settle_ms: 0,
        action_settle_ms: 0,
        ..CrawlerConfig::default()
    }
}

/// Reporter that keeps every event it receives
#[derive(Default)]
pub struct RecordingReporter {
    pub visits: Mutex<Vec<PageVisit>>,
    pub failures: Mutex<Vec<(String, String)>>,
    pub progress: Mutex<Vec<usize>>,
    pub states: Mutex<Vec<(String, Option<String>)>>,
}

impl RecordingReporter {
    pub fn visited_urls(&self) -> Vec<String> {
        self.visits
            .lock()
            .unwrap()
            .iter()
            .map(|v| v.url.clone())
            .collect()
    }

    pub fn failures(&self) -> Vec<(String, String)> {
        self.failures.lock().unwrap().clone()
    }
}

impl CrawlReporter for RecordingReporter {
    fn on_page_visited(&self, visit: &PageVisit) -> OutputResult<()> {
        self.visits.lock().unwrap().push(visit.clone());
        Ok(())
    }

    fn on_page_failed(&self, url: &str, reason: &str) -> OutputResult<()> {
        self.failures
            .lock()
            .unwrap()
            .push((url.to_string(), reason.to_string()));
        Ok(())
    }

    fn on_progress(&self, graph: &CrawlGraph) -> OutputResult<()> {
        self.progress.lock().unwrap().push(graph.page_count());
        Ok(())
    }

    fn on_state_recorded(&self, state: &PageState, via: Option<&Action>) -> OutputResult<()> {
        self.states.lock().unwrap().push((
            state.state_id.clone(),
            via.map(|action| action.action_id.clone()),
        ));
        Ok(())
    }
}
