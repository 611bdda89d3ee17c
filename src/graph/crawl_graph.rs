//! The crawl graph aggregate

use crate::graph::page::{short_digest, Page};
use crate::graph::state::{Edge, PageState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Violations of the graph's structural invariants
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("State {state_id} refers to unknown page {page_id}")]
    UnknownPage { state_id: String, page_id: String },

    #[error("State {0} already exists")]
    DuplicateState(String),

    #[error("Edge refers to unknown state {0}")]
    UnknownState(String),
}

/// A page that could not be visited
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageFailure {
    pub url: String,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

/// Pages, states and transitions discovered by one crawl
///
/// The graph is append-only: pages are never overwritten and states and
/// edges are never removed. Every state refers to a known page and every
/// edge connects two known states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlGraph {
    start_url: String,
    timestamp: DateTime<Utc>,
    pages: BTreeMap<String, Page>,
    states: BTreeMap<String, PageState>,
    edges: Vec<Edge>,
    visited_states: BTreeSet<String>,
    referrers: BTreeMap<String, BTreeSet<String>>,
    #[serde(default)]
    failures: Vec<PageFailure>,
}

impl CrawlGraph {
    pub fn new(start_url: impl Into<String>) -> Self {
        Self {
            start_url: start_url.into(),
            timestamp: Utc::now(),
            pages: BTreeMap::new(),
            states: BTreeMap::new(),
            edges: Vec::new(),
            visited_states: BTreeSet::new(),
            referrers: BTreeMap::new(),
            failures: Vec::new(),
        }
    }

    /// Storage key for graphs started from `start_url`
    pub fn key_for(start_url: &str) -> String {
        format!("graph_{}", short_digest(start_url))
    }

    pub fn key(&self) -> String {
        Self::key_for(&self.start_url)
    }

    pub fn start_url(&self) -> &str {
        &self.start_url
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Adds a page unless one with the same id already exists
    ///
    /// # Returns
    ///
    /// `true` if the page was inserted, `false` if it was already known
    pub fn add_page(&mut self, page: Page) -> bool {
        if self.pages.contains_key(&page.page_id) {
            return false;
        }
        self.pages.insert(page.page_id.clone(), page);
        true
    }

    /// Adds a new state for a known page
    pub fn add_state(&mut self, state: PageState) -> Result<(), GraphError> {
        if !self.pages.contains_key(&state.page_id) {
            return Err(GraphError::UnknownPage {
                state_id: state.state_id,
                page_id: state.page_id,
            });
        }
        if self.states.contains_key(&state.state_id) {
            return Err(GraphError::DuplicateState(state.state_id));
        }

        self.visited_states.insert(state.state_id.clone());
        self.states.insert(state.state_id.clone(), state);
        Ok(())
    }

    /// Adds a newly seen page together with its first state
    ///
    /// Neither is inserted unless the state is accepted.
    pub fn add_page_with_state(&mut self, page: Page, state: PageState) -> Result<(), GraphError> {
        if state.page_id != page.page_id {
            return Err(GraphError::UnknownPage {
                state_id: state.state_id,
                page_id: state.page_id,
            });
        }
        if self.states.contains_key(&state.state_id) {
            return Err(GraphError::DuplicateState(state.state_id));
        }

        self.add_page(page);
        self.add_state(state)
    }

    /// Adds a transition between two known states
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        for state_id in [&edge.source_state_id, &edge.target_state_id] {
            if !self.states.contains_key(state_id) {
                return Err(GraphError::UnknownState(state_id.clone()));
            }
        }
        self.edges.push(edge);
        Ok(())
    }

    /// Records that `referrer` links to `url`
    ///
    /// # Returns
    ///
    /// `true` if this referrer was not yet known for `url`
    pub fn add_referrer(&mut self, url: &str, referrer: &str) -> bool {
        self.referrers
            .entry(url.to_string())
            .or_default()
            .insert(referrer.to_string())
    }

    pub fn record_failure(&mut self, url: &str, reason: &str) {
        self.failures.push(PageFailure {
            url: url.to_string(),
            reason: reason.to_string(),
            timestamp: Utc::now(),
        });
    }

    pub fn pages(&self) -> &BTreeMap<String, Page> {
        &self.pages
    }

    pub fn states(&self) -> &BTreeMap<String, PageState> {
        &self.states
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn visited_states(&self) -> &BTreeSet<String> {
        &self.visited_states
    }

    pub fn referrers(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.referrers
    }

    pub fn failures(&self) -> &[PageFailure] {
        &self.failures
    }

    pub fn page(&self, page_id: &str) -> Option<&Page> {
        self.pages.get(page_id)
    }

    pub fn page_for_url(&self, url: &str) -> Option<&Page> {
        self.pages.values().find(|p| p.url() == url)
    }

    pub fn state(&self, state_id: &str) -> Option<&PageState> {
        self.states.get(state_id)
    }

    pub fn referrers_of(&self, url: &str) -> Option<&BTreeSet<String>> {
        self.referrers.get(url)
    }

    /// Edges leaving `state_id`, in insertion order
    pub fn transitions_from(&self, state_id: &str) -> Vec<&Edge> {
        self.edges
            .iter()
            .filter(|e| e.source_state_id == state_id)
            .collect()
    }

    pub fn states_for_page(&self, page_id: &str) -> Vec<&PageState> {
        self.states
            .values()
            .filter(|s| s.page_id == page_id)
            .collect()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Id for the next state added to this graph
    pub fn next_state_id(&self) -> String {
        format!("state_{}", self.states.len() + 1)
    }

    /// Id for the next recorded action
    pub fn next_action_id(&self) -> String {
        format!("action_{}", self.edges.len() + 1)
    }

    /// Checks the structural invariants of a graph built elsewhere
    ///
    /// Graphs built through this API always pass; this is for graphs
    /// loaded from storage.
    pub fn validate(&self) -> Result<(), GraphError> {
        for state in self.states.values() {
            if !self.pages.contains_key(&state.page_id) {
                return Err(GraphError::UnknownPage {
                    state_id: state.state_id.clone(),
                    page_id: state.page_id.clone(),
                });
            }
        }
        for edge in &self.edges {
            for state_id in [&edge.source_state_id, &edge.target_state_id] {
                if !self.states.contains_key(state_id) {
                    return Err(GraphError::UnknownState(state_id.clone()));
                }
            }
        }
        Ok(())
    }
}
