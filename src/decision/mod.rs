//! Decision makers for interactive exploration
//!
//! A decision maker looks at the current page state and proposes the next
//! action, or `None` to stop. After each new state the engine also asks
//! whether exploration should continue.

mod human;
mod scripted;

pub use human::HumanDecisionMaker;
pub use scripted::{LinkVisitorDecisionMaker, ScriptedDecisionMaker};

use crate::graph::{ActionDecision, PageState};

/// Chooses the next step of an interactive exploration
pub trait DecisionMaker {
    /// Proposes the next action from `state`, or `None` to stop
    fn decide_next_action(&mut self, state: &PageState) -> Option<ActionDecision>;

    /// Called after each new state; `false` ends the exploration
    fn should_continue_exploration(&mut self, state: &PageState) -> bool;
}
