//! Markdown crawl log
//!
//! This module appends a human-readable record of a crawl to a markdown file
//! as it happens: one section per visited page, failure and recorded state,
//! and a progress snapshot with a page tree, a Mermaid link diagram and the
//! pages reached through more than one referrer.

use crate::graph::{page_id_for, Action, CrawlGraph, PageState};
use crate::output::traits::{CrawlReporter, OutputError, OutputResult, PageVisit};
use chrono::Utc;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Children listed per node in the page tree
const TREE_CHILDREN: usize = 5;

/// Edges drawn per page in the link diagram
const DIAGRAM_EDGES: usize = 3;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Appends crawl events to a markdown file
pub struct MarkdownReporter {
    file: Mutex<File>,
}

impl MarkdownReporter {
    /// Opens `path` for appending and writes the log header
    ///
    /// Parent directories are created as needed. An existing log is kept;
    /// each crawl appends its own header.
    ///
    /// # Arguments
    ///
    /// * `path` - Path of the markdown log
    ///
    /// # Returns
    ///
    /// * `Ok(MarkdownReporter)` - The log is open
    /// * `Err(OutputError)` - The file could not be created
    pub fn create(path: &Path) -> OutputResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(format_header().as_bytes())?;

        Ok(Self {
            file: Mutex::new(file),
        })
    }

    fn append(&self, markdown: &str) -> OutputResult<()> {
        let mut file = self
            .file
            .lock()
            .map_err(|_| OutputError::Write("crawl log lock poisoned".to_string()))?;
        file.write_all(markdown.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

impl CrawlReporter for MarkdownReporter {
    fn on_page_visited(&self, visit: &PageVisit) -> OutputResult<()> {
        self.append(&format_visit(visit))
    }

    fn on_page_failed(&self, url: &str, reason: &str) -> OutputResult<()> {
        self.append(&format_failure(url, reason))
    }

    fn on_progress(&self, graph: &CrawlGraph) -> OutputResult<()> {
        self.append(&format_progress(graph))
    }

    fn on_state_recorded(&self, state: &PageState, via: Option<&Action>) -> OutputResult<()> {
        self.append(&format_state(state, via))
    }
}

fn format_header() -> String {
    let mut md = String::new();
    md.push_str("\n# Crawl Progress - Real-time Updates\n\n");
    md.push_str(&format!("*Started {}*\n\n", Utc::now().format(TIME_FORMAT)));
    md
}

/// Formats a visited page section
pub fn format_visit(visit: &PageVisit) -> String {
    let mut md = String::new();

    md.push_str(&format!("\n## Page: {}\n", visit.url));
    md.push_str(&format!("**Title**: {}\n", visit.title));
    md.push_str(&format!("**Time**: {}\n", Utc::now().format(TIME_FORMAT)));
    md.push_str(&format!(
        "**Load Time**: {:.2} seconds\n",
        visit.load_time_ms as f64 / 1000.0
    ));
    md.push_str(&format!("**Attempts**: {}\n", visit.attempts));
    if let Some(depth) = visit.depth {
        md.push_str(&format!("**Depth**: {}\n", depth));
    }
    if let Some(referrer) = &visit.referrer {
        md.push_str(&format!("**Reached From**: {}\n", referrer));
    }
    md.push_str(&format!(
        "**Interactive Elements**: {}\n",
        visit.element_count
    ));
    md.push_str(&format!("**Links**: {}\n", visit.link_count));
    md.push_str(&format!("**Page Id**: `{}`\n", visit.page_id));

    md
}

/// Formats a failed page section
pub fn format_failure(url: &str, reason: &str) -> String {
    format!("\n## ❌ Failed: {}\n**Error**: {}\n\n---\n", url, reason)
}

/// Formats a recorded state section
pub fn format_state(state: &PageState, via: Option<&Action>) -> String {
    let mut md = String::new();

    md.push_str(&format!("\n## State: {}\n", state.state_id));
    md.push_str(&format!("**URL**: {}\n", state.url));
    md.push_str(&format!("**Title**: {}\n", state.title));
    match via {
        Some(action) => md.push_str(&format!(
            "**Reached By**: {} ({}ms)\n",
            action.decision, action.duration_ms
        )),
        None => md.push_str("**Reached By**: initial page load\n"),
    }
    md.push_str(&format!("**Scroll Position**: {}px\n", state.scroll_position));
    md.push_str(&format!(
        "**Interactive Elements**: {}\n",
        state.elements.len()
    ));

    if !state.form_values.is_empty() {
        md.push_str("\n### Form Values\n");
        for (field, value) in &state.form_values {
            md.push_str(&format!("- `{}`: {}\n", field, value));
        }
    }

    md
}

/// Formats a progress snapshot of the whole graph
pub fn format_progress(graph: &CrawlGraph) -> String {
    let mut md = String::new();

    md.push_str("\n---\n");
    md.push_str(&format!(
        "\n## Current Progress - {}\n",
        Utc::now().format(TIME_FORMAT)
    ));
    md.push_str(&format!("- Pages Crawled So Far: {}\n", graph.page_count()));
    md.push_str(&format!("- States Recorded: {}\n", graph.state_count()));
    md.push_str(&format!("- Transitions: {}\n", graph.edge_count()));
    md.push_str(&format!("- Failed Pages: {}\n", graph.failures().len()));

    if graph.page_count() > 0 {
        md.push_str("\n### Page Tree\n\n```\n");
        write_tree(&mut md, graph);
        md.push_str("```\n");

        md.push_str("\n### Link Diagram\n\n```mermaid\ngraph TD\n");
        write_diagram(&mut md, graph);
        md.push_str("```\n");
    }

    let multi_path: Vec<_> = graph
        .referrers()
        .iter()
        .filter(|(_, refs)| refs.len() > 1)
        .collect();
    if !multi_path.is_empty() {
        md.push_str("\n### Pages with Multiple Entry Points\n");
        for (url, refs) in multi_path {
            md.push_str(&format!("\n#### {}\n", url));
            md.push_str("Accessible from:\n");
            for referrer in refs {
                md.push_str(&format!("- {}\n", referrer));
            }
        }
    }
    md.push('\n');

    md
}

/// Writes the crawled pages as a tree rooted at the start page
///
/// Each page is expanded once; later occurrences are marked.
fn write_tree(md: &mut String, graph: &CrawlGraph) {
    let root = graph
        .page_for_url(graph.start_url())
        .or_else(|| graph.pages().values().next())
        .map(|page| page.url().to_string());

    if let Some(root) = root {
        let mut expanded = HashSet::new();
        write_node(md, graph, &root, 0, &mut expanded);
    }
}

fn write_node(
    md: &mut String,
    graph: &CrawlGraph,
    url: &str,
    indent: usize,
    expanded: &mut HashSet<String>,
) {
    let prefix = "    ".repeat(indent);
    if !expanded.insert(url.to_string()) {
        md.push_str(&format!("{}└── {} (seen)\n", prefix, short_url(url, 50)));
        return;
    }
    md.push_str(&format!("{}└── {}\n", prefix, short_url(url, 50)));

    if let Some(page) = graph.page_for_url(url) {
        let mut links: Vec<&String> = page.links.iter().collect();
        links.sort();
        for link in links.into_iter().take(TREE_CHILDREN) {
            write_node(md, graph, link, indent + 1, expanded);
        }
    }
}

fn write_diagram(md: &mut String, graph: &CrawlGraph) {
    let mut written = HashSet::new();

    for page in graph.pages().values() {
        md.push_str(&format!(
            "    {}[\"{}\"]\n",
            page.page_id,
            short_url(page.url(), 20)
        ));
    }

    for page in graph.pages().values() {
        for link in page.links.iter().take(DIAGRAM_EDGES) {
            let edge = format!("{}-->{}", page.page_id, page_id_for(link));
            if written.insert(edge.clone()) {
                md.push_str(&format!("    {}\n", edge));
            }
        }
    }
}

/// Strips the scheme and truncates to `max` characters
fn short_url(url: &str, max: usize) -> String {
    let bare = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);

    if bare.chars().count() > max {
        let cut: String = bare.chars().take(max).collect();
        format!("{}...", cut)
    } else {
        bare.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ActionDecision, Page, PageMetadata};
    use std::collections::BTreeMap;

    fn page(url: &str, links: &[&str]) -> Page {
        Page::new(
            PageMetadata {
                url: url.to_string(),
                title: format!("Title of {}", url),
                timestamp: Utc::now(),
                total_width: 1280,
                total_height: 800,
                viewport_width: 1280,
                viewport_height: 800,
                load_time_ms: 12,
            },
            vec![],
            vec![],
            links.iter().map(|l| l.to_string()).collect(),
        )
    }

    fn graph() -> CrawlGraph {
        let mut graph = CrawlGraph::new("https://site.test/");
        graph.add_page(page(
            "https://site.test/",
            &["https://site.test/a", "https://site.test/b"],
        ));
        graph.add_page(page("https://site.test/a", &["https://site.test/b"]));
        graph.add_referrer("https://site.test/a", "https://site.test/");
        graph.add_referrer("https://site.test/b", "https://site.test/");
        graph.add_referrer("https://site.test/b", "https://site.test/a");
        graph
    }

    #[test]
    fn test_format_visit() {
        let md = format_visit(&PageVisit {
            url: "https://site.test/a".to_string(),
            page_id: page_id_for("https://site.test/a"),
            title: "A".to_string(),
            depth: Some(1),
            referrer: Some("https://site.test/".to_string()),
            attempts: 2,
            load_time_ms: 1500,
            element_count: 4,
            link_count: 3,
        });

        assert!(md.contains("## Page: https://site.test/a"));
        assert!(md.contains("**Load Time**: 1.50 seconds"));
        assert!(md.contains("**Attempts**: 2"));
        assert!(md.contains("**Depth**: 1"));
        assert!(md.contains("**Reached From**: https://site.test/"));
    }

    #[test]
    fn test_format_failure() {
        let md = format_failure("https://site.test/x", "Timeout after 3 attempts");
        assert!(md.contains("## ❌ Failed: https://site.test/x"));
        assert!(md.contains("**Error**: Timeout after 3 attempts"));
    }

    #[test]
    fn test_progress_lists_multiple_entry_points() {
        let md = format_progress(&graph());

        assert!(md.contains("- Pages Crawled So Far: 2"));
        assert!(md.contains("### Pages with Multiple Entry Points"));
        assert!(md.contains("#### https://site.test/b"));
        assert!(!md.contains("#### https://site.test/a\n"));
    }

    #[test]
    fn test_progress_tree_expands_each_page_once() {
        let md = format_progress(&graph());

        assert!(md.contains("└── site.test/\n"));
        assert!(md.contains("    └── site.test/a\n"));
        assert!(md.contains("└── site.test/b (seen)"));
        assert!(md.contains("```mermaid"));
    }

    #[test]
    fn test_format_state() {
        let mut form_values = BTreeMap::new();
        form_values.insert("q".to_string(), "rust".to_string());
        let action = Action::completed("action_1".to_string(), ActionDecision::click("button_1"), 40);
        let state = PageState {
            state_id: "state_2".to_string(),
            page_id: page_id_for("https://site.test/"),
            url: "https://site.test/".to_string(),
            title: "Home".to_string(),
            timestamp: Utc::now(),
            scroll_position: 0,
            form_values,
            elements: vec![],
            action_history: vec![action.clone()],
        };

        let md = format_state(&state, Some(&action));
        assert!(md.contains("## State: state_2"));
        assert!(md.contains("**Reached By**: click button_1 (40ms)"));
        assert!(md.contains("- `q`: rust"));
    }

    #[test]
    fn test_short_url() {
        assert_eq!(short_url("https://site.test/a", 50), "site.test/a");
        assert_eq!(short_url("http://abcdefgh", 4), "abcd...");
    }

    #[test]
    fn test_create_appends_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("crawl_log.md");

        let reporter = MarkdownReporter::create(&path).unwrap();
        reporter
            .on_page_failed("https://site.test/x", "refused")
            .unwrap();
        drop(reporter);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("\n# Crawl Progress - Real-time Updates"));
        assert!(content.contains("## ❌ Failed: https://site.test/x"));
    }
}
