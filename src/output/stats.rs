//! Statistics over a crawl graph
//!
//! This module summarizes a finished (or checkpointed) crawl graph for the
//! `--stats` command.

use crate::graph::{ActionType, CrawlGraph, ElementType};
use std::collections::BTreeMap;

/// Crawl statistics summary
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlStatistics {
    /// URL the crawl started from
    pub start_url: String,

    /// Number of unique pages
    pub total_pages: usize,

    /// Number of recorded states
    pub total_states: usize,

    /// Number of transitions between states
    pub total_edges: usize,

    /// Number of pages that could not be visited
    pub total_failures: usize,

    /// Total outbound links across all pages
    pub total_links: usize,

    /// Interactive elements by category, across all pages
    pub elements_by_type: BTreeMap<ElementType, usize>,

    /// Executed actions by kind
    pub actions_by_type: BTreeMap<ActionType, usize>,

    /// Pages reached from more than one referrer, with their referrer count
    pub multi_referrer_pages: Vec<(String, usize)>,

    /// Longest action history of any state
    pub deepest_history: usize,
}

impl CrawlStatistics {
    /// Computes statistics for a graph
    ///
    /// # Arguments
    ///
    /// * `graph` - The graph to summarize
    ///
    /// # Returns
    ///
    /// The statistics
    pub fn from_graph(graph: &CrawlGraph) -> Self {
        let mut elements_by_type = BTreeMap::new();
        for element in graph.pages().values().flat_map(|p| &p.interactive_elements) {
            *elements_by_type.entry(element.element_type).or_insert(0) += 1;
        }

        let mut actions_by_type = BTreeMap::new();
        for edge in graph.edges() {
            *actions_by_type.entry(edge.action.action_type()).or_insert(0) += 1;
        }

        let mut multi_referrer_pages: Vec<(String, usize)> = graph
            .referrers()
            .iter()
            .filter(|(_, refs)| refs.len() > 1)
            .map(|(url, refs)| (url.clone(), refs.len()))
            .collect();
        multi_referrer_pages.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Self {
            start_url: graph.start_url().to_string(),
            total_pages: graph.page_count(),
            total_states: graph.state_count(),
            total_edges: graph.edge_count(),
            total_failures: graph.failures().len(),
            total_links: graph.pages().values().map(|p| p.links.len()).sum(),
            elements_by_type,
            actions_by_type,
            multi_referrer_pages,
            deepest_history: graph
                .states()
                .values()
                .map(|s| s.action_history.len())
                .max()
                .unwrap_or(0),
        }
    }

    /// Share of attempted pages that were visited, in percent
    pub fn success_rate(&self) -> f64 {
        let attempted = self.total_pages + self.total_failures;
        if attempted == 0 {
            0.0
        } else {
            (self.total_pages as f64 / attempted as f64) * 100.0
        }
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Start URL: {}", stats.start_url);
    println!("  Pages: {}", stats.total_pages);
    println!("  States: {}", stats.total_states);
    println!("  Transitions: {}", stats.total_edges);
    println!("  Links found: {}", stats.total_links);
    println!("  Failed pages: {}", stats.total_failures);
    println!();

    if !stats.elements_by_type.is_empty() {
        println!("Interactive Elements by Type:");
        let mut counts: Vec<_> = stats.elements_by_type.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1));
        for (element_type, count) in counts {
            println!("  {}: {}", element_type, count);
        }
        println!();
    }

    if !stats.actions_by_type.is_empty() {
        println!("Actions by Type:");
        for (action_type, count) in &stats.actions_by_type {
            println!("  {}: {}", action_type, count);
        }
        println!("  Deepest action history: {}", stats.deepest_history);
        println!();
    }

    if !stats.multi_referrer_pages.is_empty() {
        println!(
            "Pages with Multiple Entry Points ({}):",
            stats.multi_referrer_pages.len()
        );
        for (url, count) in stats.multi_referrer_pages.iter().take(20) {
            println!("  - {} ({} referrers)", url, count);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} pages visited)",
        stats.success_rate(),
        stats.total_pages,
        stats.total_pages + stats.total_failures
    );
}
