//! Non-interactive decision makers

use crate::decision::DecisionMaker;
use crate::graph::{ActionDecision, ElementType, PageState};
use crate::url::{resolve_link, same_domain};
use std::collections::{HashSet, VecDeque};
use url::Url;

/// Replays a fixed sequence of decisions
///
/// Stops when the sequence is exhausted. An optional continuation budget
/// limits how many times `should_continue_exploration` answers yes.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDecisionMaker {
    decisions: VecDeque<ActionDecision>,
    continue_budget: Option<usize>,
    observed: Vec<String>,
}

impl ScriptedDecisionMaker {
    pub fn new(decisions: Vec<ActionDecision>) -> Self {
        Self {
            decisions: decisions.into(),
            continue_budget: None,
            observed: Vec::new(),
        }
    }

    pub fn with_continue_budget(mut self, budget: usize) -> Self {
        self.continue_budget = Some(budget);
        self
    }

    /// State ids seen by `decide_next_action`, in order
    pub fn observed_states(&self) -> &[String] {
        &self.observed
    }

    pub fn remaining(&self) -> usize {
        self.decisions.len()
    }
}

impl DecisionMaker for ScriptedDecisionMaker {
    fn decide_next_action(&mut self, state: &PageState) -> Option<ActionDecision> {
        self.observed.push(state.state_id.clone());
        self.decisions.pop_front()
    }

    fn should_continue_exploration(&mut self, _state: &PageState) -> bool {
        match self.continue_budget.as_mut() {
            None => true,
            Some(0) => false,
            Some(budget) => {
                *budget -= 1;
                true
            }
        }
    }
}

/// Clicks every same-site link once
///
/// From each state it clicks the first link whose target has not been
/// reached yet. When a page offers no new links it navigates back to the
/// first page it saw; when that page has none left it stops.
#[derive(Debug, Clone)]
pub struct LinkVisitorDecisionMaker {
    max_actions: usize,
    actions: usize,
    home: Option<String>,
    reached: HashSet<String>,
}

impl Default for LinkVisitorDecisionMaker {
    fn default() -> Self {
        Self::new(50)
    }
}

impl LinkVisitorDecisionMaker {
    pub fn new(max_actions: usize) -> Self {
        Self {
            max_actions,
            actions: 0,
            home: None,
            reached: HashSet::new(),
        }
    }

    fn next_link(&self, state: &PageState, home: &str) -> Option<(String, String)> {
        let base = Url::parse(&state.url).ok()?;
        state
            .elements
            .iter()
            .filter(|e| e.element_type == ElementType::Link)
            .find_map(|e| {
                let target = resolve_link(e.href.as_deref()?, &base)?;
                let fresh = !self.reached.contains(&target) && same_domain(&target, home);
                fresh.then(|| (e.element_id.clone(), target))
            })
    }
}

impl DecisionMaker for LinkVisitorDecisionMaker {
    fn decide_next_action(&mut self, state: &PageState) -> Option<ActionDecision> {
        if self.actions >= self.max_actions {
            return None;
        }

        let home = self.home.get_or_insert_with(|| state.url.clone()).clone();
        self.reached.insert(state.url.clone());

        match self.next_link(state, &home) {
            Some((element_id, target)) => {
                self.reached.insert(target);
                self.actions += 1;
                Some(ActionDecision::click(element_id))
            }
            None if state.url != home => {
                self.actions += 1;
                Some(ActionDecision::navigate(home))
            }
            None => None,
        }
    }

    fn should_continue_exploration(&mut self, _state: &PageState) -> bool {
        self.actions < self.max_actions
    }
}
