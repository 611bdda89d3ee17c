//! Crawls over HTTP against a wiremock server

use crate::common::{fast_config, RecordingReporter};
use std::sync::Arc;
use ui_cartographer::config::{parse_config, DriverConfig};
use ui_cartographer::decision::ScriptedDecisionMaker;
use ui_cartographer::driver::HttpPageDriver;
use ui_cartographer::{ActionDecision, CrawlEngine, StopReason};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><head><title>Page</title></head><body>{}</body></html>", body),
        "text/html; charset=utf-8",
    )
}

async fn mount(server: &MockServer, route: &str, response: ResponseTemplate, hits: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .expect(hits)
        .mount(server)
        .await;
}

fn driver() -> HttpPageDriver {
    HttpPageDriver::new(&DriverConfig::default()).unwrap()
}

#[tokio::test]
async fn test_bfs_over_http() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount(
        &server,
        "/",
        html(r#"<a href="/a">A</a><a href="/missing">Gone</a><a href="/report.pdf">PDF</a>"#),
        1,
    )
    .await;
    mount(&server, "/a", html(r#"<a href="/">Home</a><button>Save</button>"#), 1).await;
    mount(
        &server,
        "/report.pdf",
        ResponseTemplate::new(200).set_body_raw("%PDF-1.4", "application/pdf"),
        1,
    )
    .await;

    let reporter = Arc::new(RecordingReporter::default());
    let mut engine = CrawlEngine::new(driver(), &fast_config()).with_reporter(reporter.clone());
    let graph = engine.crawl_bfs(&format!("{}/", base)).await;

    assert_eq!(graph.page_count(), 2);
    let page_a = graph.page_for_url(&format!("{}/a", base)).unwrap();
    assert_eq!(page_a.title(), "Page");
    assert_eq!(page_a.interactive_elements.len(), 2);

    // Neither failure is a timeout, so each URL was requested once
    let failures = reporter.failures();
    assert_eq!(failures.len(), 2);
    assert!(failures
        .iter()
        .any(|(url, reason)| url.ends_with("/missing") && reason.contains("404")));
    assert!(failures
        .iter()
        .any(|(url, reason)| url.ends_with("/report.pdf") && reason.contains("application/pdf")));
    assert_eq!(graph.failures().len(), 2);
}

#[tokio::test]
async fn test_clicking_a_link_over_http() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount(&server, "/", html(r#"<a href="/next">Next</a>"#), 1).await;
    mount(&server, "/next", html("<p>Arrived</p>"), 1).await;

    let mut engine = CrawlEngine::new(driver(), &fast_config());
    let mut decisions = ScriptedDecisionMaker::new(vec![ActionDecision::click("link_1")]);
    let exploration = engine.explore(&format!("{}/", base), &mut decisions).await;

    assert_eq!(exploration.stop_reason, StopReason::DecisionMakerStopped);
    assert_eq!(exploration.graph.state_count(), 2);
    assert_eq!(
        exploration.graph.state("state_2").unwrap().url,
        format!("{}/next", base)
    );
}

#[tokio::test]
async fn test_hover_is_unsupported_over_http() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount(&server, "/", html("<button>Save</button>"), 1).await;

    let mut engine = CrawlEngine::new(driver(), &fast_config());
    let mut decisions = ScriptedDecisionMaker::new(vec![ActionDecision::hover("button_1")]);
    let exploration = engine.explore(&format!("{}/", base), &mut decisions).await;

    match exploration.stop_reason {
        StopReason::ActionFailed { error, .. } => assert!(error.contains("hover")),
        other => panic!("unexpected stop reason {:?}", other),
    }
    assert_eq!(exploration.graph.state_count(), 1);
}

#[tokio::test]
async fn test_run_writes_graph_and_crawl_log() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount(&server, "/", html(r#"<a href="/a">A</a>"#), 1).await;
    mount(&server, "/a", html("<p>Leaf</p>"), 1).await;

    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    let log_path = dir.path().join("crawl_log.md");
    let config = parse_config(&format!(
        r#"
[crawl]
start-url = "{base}/"

[crawler]
retry-delay-ms = 0
scroll-settle-ms = 0
action-settle-ms = 0

[output]
data-dir = "{data}"
log-path = "{log}"
"#,
        base = base,
        data = data_dir.display(),
        log = log_path.display(),
    ))
    .unwrap();

    let graph = ui_cartographer::crawler::run(&config).await.unwrap();
    assert_eq!(graph.page_count(), 2);

    let key = ui_cartographer::CrawlGraph::key_for(&config.crawl.start_url);
    assert!(data_dir.join("graphs").join(format!("{}.json", key)).exists());
    assert_eq!(std::fs::read_dir(data_dir.join("pages")).unwrap().count(), 2);

    let log = std::fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("# Crawl Progress - Real-time Updates"));
    assert!(log.contains(&format!("## Page: {}/a", base)));
    assert!(log.contains("- Pages Crawled So Far: 2"));
}
