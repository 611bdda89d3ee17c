//! Actions: what a decision maker proposes and what the engine executed

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Click,
    Input,
    Hover,
    Scroll,
    Navigate,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Input => "input",
            Self::Hover => "hover",
            Self::Scroll => "scroll",
            Self::Navigate => "navigate",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a scroll action moves the viewport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollTarget {
    /// Absolute vertical offset in pixels
    Position(i64),
    /// Scroll the element with this id into view
    Element(String),
}

/// A proposed next step, as chosen by a decision maker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action_type", rename_all = "snake_case")]
pub enum ActionDecision {
    Click { element_id: String },
    Input { element_id: String, value: String },
    Hover { element_id: String },
    Scroll { target: ScrollTarget },
    Navigate { url: String },
}

impl ActionDecision {
    pub fn click(element_id: impl Into<String>) -> Self {
        Self::Click {
            element_id: element_id.into(),
        }
    }

    pub fn input(element_id: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Input {
            element_id: element_id.into(),
            value: value.into(),
        }
    }

    pub fn hover(element_id: impl Into<String>) -> Self {
        Self::Hover {
            element_id: element_id.into(),
        }
    }

    pub fn scroll_to(position: i64) -> Self {
        Self::Scroll {
            target: ScrollTarget::Position(position),
        }
    }

    pub fn scroll_to_element(element_id: impl Into<String>) -> Self {
        Self::Scroll {
            target: ScrollTarget::Element(element_id.into()),
        }
    }

    pub fn navigate(url: impl Into<String>) -> Self {
        Self::Navigate { url: url.into() }
    }

    pub fn action_type(&self) -> ActionType {
        match self {
            Self::Click { .. } => ActionType::Click,
            Self::Input { .. } => ActionType::Input,
            Self::Hover { .. } => ActionType::Hover,
            Self::Scroll { .. } => ActionType::Scroll,
            Self::Navigate { .. } => ActionType::Navigate,
        }
    }

    /// The element this action targets, if any
    pub fn element_id(&self) -> Option<&str> {
        match self {
            Self::Click { element_id }
            | Self::Input { element_id, .. }
            | Self::Hover { element_id } => Some(element_id),
            Self::Scroll {
                target: ScrollTarget::Element(element_id),
            } => Some(element_id),
            Self::Scroll { .. } | Self::Navigate { .. } => None,
        }
    }
}

impl fmt::Display for ActionDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Click { element_id } => write!(f, "click {}", element_id),
            Self::Input { element_id, value } => write!(f, "input {} = {:?}", element_id, value),
            Self::Hover { element_id } => write!(f, "hover {}", element_id),
            Self::Scroll {
                target: ScrollTarget::Position(px),
            } => write!(f, "scroll to {}px", px),
            Self::Scroll {
                target: ScrollTarget::Element(element_id),
            } => write!(f, "scroll to {}", element_id),
            Self::Navigate { url } => write!(f, "navigate {}", url),
        }
    }
}

/// An executed action, as recorded in state histories and edges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub action_id: String,
    pub decision: ActionDecision,
    pub timestamp: DateTime<Utc>,
    pub duration_ms: u64,
    pub success: bool,
    pub error_message: Option<String>,
}

impl Action {
    /// Records a successfully executed decision
    pub fn completed(action_id: String, decision: ActionDecision, duration_ms: u64) -> Self {
        Self {
            action_id,
            decision,
            timestamp: Utc::now(),
            duration_ms,
            success: true,
            error_message: None,
        }
    }

    pub fn action_type(&self) -> ActionType {
        self.decision.action_type()
    }
}
