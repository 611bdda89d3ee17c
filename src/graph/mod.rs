//! Crawl graph data model
//!
//! Pages are unique URLs, states are snapshots of a page during an
//! exploration, and edges are the actions that moved between states.

mod action;
mod crawl_graph;
mod element;
mod page;
mod state;

pub use action::{Action, ActionDecision, ActionType, ScrollTarget};
pub use crawl_graph::{CrawlGraph, GraphError, PageFailure};
pub use element::{
    ElementLocation, ElementSummary, ElementType, InteractiveElement, ScreenshotSection,
};
pub use page::{page_id_for, Page, PageMetadata, Screenshot};
pub use state::{Edge, PageState};
