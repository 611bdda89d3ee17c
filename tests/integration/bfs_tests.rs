//! Breadth-first crawl tests against the in-memory driver

use crate::common::{fast_config, RecordingReporter};
use std::collections::BTreeSet;
use std::sync::Arc;
use ui_cartographer::config::CrawlerConfig;
use ui_cartographer::driver::{MemoryDriver, MemorySite};
use ui_cartographer::storage::{CrawlRepository, JsonRepository};
use ui_cartographer::CrawlEngine;

const A: &str = "https://site.test/";
const B: &str = "https://site.test/b";
const C: &str = "https://site.test/c";
const D: &str = "https://site.test/d";
const E: &str = "https://site.test/e";

/// A links to B and C, B links to D, D links to E
fn chain_site() -> MemorySite {
    MemorySite::new()
        .page(A, r#"<title>A</title><a href="/b">B</a><a href="/c">C</a>"#)
        .page(B, r#"<title>B</title><a href="/d">D</a>"#)
        .page(C, "<title>C</title>")
        .page(D, r#"<title>D</title><a href="/e">E</a>"#)
        .page(E, "<title>E</title>")
}

fn refs(urls: &[&str]) -> BTreeSet<String> {
    urls.iter().map(|u| u.to_string()).collect()
}

fn engine(site: MemorySite, config: &CrawlerConfig) -> (CrawlEngine<MemoryDriver>, Arc<RecordingReporter>) {
    let reporter = Arc::new(RecordingReporter::default());
    let engine = CrawlEngine::new(site.into_driver(), config).with_reporter(reporter.clone());
    (engine, reporter)
}

#[tokio::test]
async fn test_depth_two_scenario() {
    let (mut engine, reporter) = engine(chain_site(), &fast_config());

    let graph = engine.crawl_bfs(A).await;

    let visited: BTreeSet<&str> = graph.pages().values().map(|p| p.url()).collect();
    assert_eq!(visited, [A, B, C, D].into_iter().collect());
    assert_eq!(graph.referrers_of(D), Some(&refs(&[B])));

    // Each page within reach is loaded exactly once, the page beyond never
    for url in [A, B, C, D] {
        assert_eq!(engine.driver().navigation_count(url), 1, "{}", url);
    }
    assert_eq!(engine.driver().navigation_count(E), 0);

    // BFS order: the whole first level before the second
    assert_eq!(reporter.visited_urls(), vec![A, B, C, D]);
    let depths: Vec<Option<u32>> = reporter.visits.lock().unwrap().iter().map(|v| v.depth).collect();
    assert_eq!(depths, vec![Some(0), Some(1), Some(1), Some(2)]);
}

#[tokio::test]
async fn test_max_depth_bounds_the_crawl() {
    let config = CrawlerConfig {
        max_depth: 1,
        ..fast_config()
    };
    let (mut engine, _) = engine(chain_site(), &config);

    let graph = engine.crawl_bfs(A).await;
    assert_eq!(graph.page_count(), 3);
    assert!(graph.page_for_url(D).is_none());
    // Links found on the deepest pages are still recorded as referrers
    assert_eq!(graph.referrers_of(D), Some(&refs(&[B])));
}

#[tokio::test]
async fn test_referrers_are_complete() {
    let site = MemorySite::new()
        .page(A, r#"<a href="/b">B</a><a href="/c">C</a>"#)
        .page(B, r#"<a href="/c">C</a><a href="/">Home</a>"#)
        .page(C, r#"<a href="/b">B</a>"#);
    let (mut engine, _) = engine(site, &fast_config());

    let graph = engine.crawl_bfs(A).await;
    assert_eq!(graph.page_count(), 3);
    assert_eq!(graph.referrers_of(C), Some(&refs(&[A, B])));
    assert_eq!(graph.referrers_of(B), Some(&refs(&[A, C])));
    assert_eq!(graph.referrers_of(A), Some(&refs(&[B])));
    assert_eq!(engine.driver().navigation_count(C), 1);
}

#[tokio::test]
async fn test_default_crawl_follows_other_hosts() {
    let other = "https://other.test/";
    let site = MemorySite::new()
        .page(A, r#"<a href="https://other.test/">Other</a>"#)
        .page(other, "<title>Other</title>");
    let (mut engine, _) = engine(site, &fast_config());

    let graph = engine.crawl_bfs(A).await;

    assert_eq!(graph.page_count(), 2);
    assert_eq!(engine.driver().navigation_count(other), 1);
    assert_eq!(graph.referrers_of(other), Some(&refs(&[A])));
}

#[tokio::test(start_paused = true)]
async fn test_always_timing_out_page_is_retried_three_times() {
    let site = MemorySite::new()
        .page(A, r#"<a href="/b">B</a>"#)
        .page(B, "<title>B</title>")
        .timeout_on(B, 100);
    let config = CrawlerConfig::default();
    let (mut engine, reporter) = engine(site, &config);

    let graph = engine.crawl_bfs(A).await;

    assert_eq!(engine.driver().navigation_count(B), 3);
    assert_eq!(
        reporter.failures(),
        vec![(B.to_string(), "Timeout after 3 attempts".to_string())]
    );
    assert_eq!(graph.failures().len(), 1);
    assert_eq!(graph.failures()[0].url, B);
    assert_eq!(graph.page_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_transient_timeouts_recover() {
    let site = MemorySite::new()
        .page(A, "<title>A</title>")
        .timeout_on(A, 2);
    let (mut engine, reporter) = engine(site, &CrawlerConfig::default());

    let graph = engine.crawl_bfs(A).await;

    assert_eq!(graph.page_count(), 1);
    assert!(graph.failures().is_empty());
    assert_eq!(reporter.visits.lock().unwrap()[0].attempts, 3);
}

#[tokio::test]
async fn test_broken_link_does_not_stop_the_crawl() {
    let site = MemorySite::new()
        .page(A, r#"<a href="/missing">Missing</a><a href="/c">C</a>"#)
        .page(C, "<title>C</title>");
    let (mut engine, reporter) = engine(site, &fast_config());

    let graph = engine.crawl_bfs(A).await;

    assert_eq!(graph.page_count(), 2);
    assert_eq!(engine.driver().navigation_count("https://site.test/missing"), 1);
    assert_eq!(reporter.failures().len(), 1);
    assert!(reporter.failures()[0].1.contains("404"));
}

#[tokio::test]
async fn test_checkpoints_save_the_graph() {
    let dir = tempfile::tempdir().unwrap();
    let repository = JsonRepository::new(dir.path()).unwrap();
    let config = CrawlerConfig {
        checkpoint_interval: 2,
        ..fast_config()
    };
    let reporter = Arc::new(RecordingReporter::default());
    let mut engine = CrawlEngine::new(chain_site().into_driver(), &config)
        .with_reporter(reporter.clone())
        .with_repository(Box::new(repository.clone()));

    let graph = engine.crawl_bfs(A).await;

    // Two checkpoints (after pages 2 and 4) plus the final snapshot
    assert_eq!(*reporter.progress.lock().unwrap(), vec![2, 4, 4]);

    let saved = repository.load_graph(A).unwrap().unwrap();
    assert_eq!(saved, graph);

    for page in graph.pages().values() {
        assert_eq!(repository.load_page(&page.page_id).unwrap().as_ref(), Some(page));
    }
}
