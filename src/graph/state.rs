//! Page states and the edges between them

use crate::graph::action::Action;
use crate::graph::element::ElementSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A snapshot of a page at a point in an exploration
///
/// States are never modified after being added to a graph. The first state
/// of an exploration has an empty action history; every later state's
/// history is its predecessor's history plus the action that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageState {
    pub state_id: String,
    pub page_id: String,
    pub url: String,
    pub title: String,
    pub timestamp: DateTime<Utc>,
    pub scroll_position: i64,
    /// Field id to current value
    pub form_values: BTreeMap<String, String>,
    pub elements: Vec<ElementSummary>,
    pub action_history: Vec<Action>,
}

impl PageState {
    pub fn is_initial(&self) -> bool {
        self.action_history.is_empty()
    }

    pub fn last_action(&self) -> Option<&Action> {
        self.action_history.last()
    }

    pub fn element(&self, element_id: &str) -> Option<&ElementSummary> {
        self.elements.iter().find(|e| e.element_id == element_id)
    }
}

/// A transition from one state to another via exactly one action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source_state_id: String,
    pub target_state_id: String,
    pub action: Action,
    pub weight: f64,
    pub transition_time_ms: u64,
}

impl Edge {
    pub fn new(source_state_id: String, target_state_id: String, action: Action) -> Self {
        let transition_time_ms = action.duration_ms;
        Self {
            source_state_id,
            target_state_id,
            action,
            weight: 1.0,
            transition_time_ms,
        }
    }
}
