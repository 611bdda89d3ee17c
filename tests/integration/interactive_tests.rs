//! Decision-driven exploration tests against the in-memory driver

use crate::common::{fast_config, RecordingReporter};
use std::sync::Arc;
use ui_cartographer::decision::{LinkVisitorDecisionMaker, ScriptedDecisionMaker};
use ui_cartographer::driver::{MemoryDriver, MemorySite};
use ui_cartographer::graph::{ActionType, CrawlGraph};
use ui_cartographer::storage::{CrawlRepository, JsonRepository};
use ui_cartographer::{ActionDecision, CrawlEngine, StopReason};

const HOME: &str = "https://site.test/";
const NEXT: &str = "https://site.test/next";

fn site() -> MemorySite {
    MemorySite::new()
        .page(
            HOME,
            r#"<html><head><title>Home</title></head><body data-height="2400">
                <button data-navigate="https://site.test/next">Continue</button>
                <button data-fails>Broken</button>
                <input id="q" type="text">
            </body></html>"#,
        )
        .page(NEXT, r#"<title>Next</title><a href="/">Back</a>"#)
}

fn engine() -> (CrawlEngine<MemoryDriver>, Arc<RecordingReporter>) {
    let reporter = Arc::new(RecordingReporter::default());
    let engine = CrawlEngine::new(site().into_driver(), &fast_config()).with_reporter(reporter.clone());
    (engine, reporter)
}

#[tokio::test]
async fn test_click_then_stop() {
    let (mut engine, reporter) = engine();
    let mut decisions = ScriptedDecisionMaker::new(vec![ActionDecision::click("button_1")]);

    let exploration = engine.explore(HOME, &mut decisions).await;
    let graph = exploration.graph;

    assert_eq!(exploration.stop_reason, StopReason::DecisionMakerStopped);
    assert_eq!(graph.state_count(), 2);
    assert_eq!(graph.edge_count(), 1);
    assert_eq!(graph.page_count(), 2);

    let edge = &graph.edges()[0];
    assert_eq!(edge.source_state_id, "state_1");
    assert_eq!(edge.target_state_id, "state_2");
    assert_eq!(edge.weight, 1.0);
    assert_eq!(edge.action.action_type(), ActionType::Click);
    assert!(edge.action.success);

    let state = graph.state("state_2").unwrap();
    assert_eq!(state.url, NEXT);
    assert_eq!(state.title, "Next");
    assert_eq!(state.action_history, vec![edge.action.clone()]);

    assert_eq!(
        *reporter.states.lock().unwrap(),
        vec![
            ("state_1".to_string(), None),
            ("state_2".to_string(), Some("action_1".to_string())),
        ]
    );
    // The decision maker saw both states
    assert_eq!(decisions.observed_states(), ["state_1", "state_2"]);
}

#[tokio::test]
async fn test_repeating_actions_grows_the_graph() {
    let (mut engine, _) = engine();
    let mut decisions = ScriptedDecisionMaker::new(vec![
        ActionDecision::scroll_to(600),
        ActionDecision::scroll_to(600),
        ActionDecision::scroll_to(600),
    ]);

    let exploration = engine.explore(HOME, &mut decisions).await;
    let graph = exploration.graph;

    assert_eq!(graph.state_count(), 4);
    assert_eq!(graph.edge_count(), 3);
    // One page, many states
    assert_eq!(graph.page_count(), 1);

    let initial = graph.state("state_1").unwrap();
    assert!(initial.action_history.is_empty());
    assert_eq!(initial.scroll_position, 0);

    let last = graph.state("state_4").unwrap();
    assert_eq!(last.action_history.len(), 3);
    assert_eq!(last.scroll_position, 600);

    let targets: Vec<&str> = graph
        .edges()
        .iter()
        .map(|e| e.target_state_id.as_str())
        .collect();
    assert_eq!(targets, vec!["state_2", "state_3", "state_4"]);
    assert!(graph.validate().is_ok());
}

#[tokio::test]
async fn test_failed_action_records_nothing() {
    let (mut engine, reporter) = engine();
    let mut decisions = ScriptedDecisionMaker::new(vec![
        ActionDecision::click("button_2"),
        ActionDecision::click("button_1"),
    ]);

    let exploration = engine.explore(HOME, &mut decisions).await;

    match &exploration.stop_reason {
        StopReason::ActionFailed {
            state_id, action, ..
        } => {
            assert_eq!(state_id, "state_1");
            assert_eq!(action, &ActionDecision::click("button_2"));
        }
        other => panic!("unexpected stop reason {:?}", other),
    }
    assert_eq!(exploration.graph.state_count(), 1);
    assert_eq!(exploration.graph.edge_count(), 0);
    assert_eq!(decisions.remaining(), 1);
    assert_eq!(reporter.states.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_input_is_reflected_in_form_values() {
    let (mut engine, _) = engine();
    let mut decisions =
        ScriptedDecisionMaker::new(vec![ActionDecision::input("text_input_1", "cartography")]);

    let exploration = engine.explore(HOME, &mut decisions).await;
    let graph = exploration.graph;

    assert_eq!(graph.state("state_1").unwrap().form_values["q"], "");
    assert_eq!(graph.state("state_2").unwrap().form_values["q"], "cartography");
}

#[tokio::test]
async fn test_declining_to_continue_stops_after_new_state() {
    let (mut engine, _) = engine();
    let mut decisions = ScriptedDecisionMaker::new(vec![
        ActionDecision::scroll_to(100),
        ActionDecision::scroll_to(200),
    ])
    .with_continue_budget(0);

    let exploration = engine.explore(HOME, &mut decisions).await;
    assert_eq!(exploration.stop_reason, StopReason::ExplorationDeclined);
    assert_eq!(exploration.graph.state_count(), 2);
}

#[tokio::test]
async fn test_navigate_action_reaches_new_page() {
    let (mut engine, _) = engine();
    let mut decisions = ScriptedDecisionMaker::new(vec![
        ActionDecision::navigate(NEXT),
        ActionDecision::navigate(HOME),
    ]);

    let exploration = engine.explore(HOME, &mut decisions).await;
    let graph = exploration.graph;

    assert_eq!(graph.state_count(), 3);
    assert_eq!(graph.page_count(), 2);
    // Returning home adds a state but not a page
    let home_states = graph.states_for_page(&graph.state("state_1").unwrap().page_id);
    assert_eq!(home_states.len(), 2);
}

#[tokio::test]
async fn test_link_visitor_explores_site() {
    let site = MemorySite::new()
        .page(HOME, r#"<a href="/a">A</a><a href="/b">B</a>"#)
        .page("https://site.test/a", r#"<a href="/">Home</a>"#)
        .page("https://site.test/b", "<title>B</title>");
    let mut engine = CrawlEngine::new(site.into_driver(), &fast_config());
    let mut decisions = LinkVisitorDecisionMaker::new(10);

    let exploration = engine.explore(HOME, &mut decisions).await;
    let graph = exploration.graph;

    assert_eq!(exploration.stop_reason, StopReason::DecisionMakerStopped);
    assert_eq!(graph.page_count(), 3);
    assert!(graph.page_for_url("https://site.test/b").is_some());
}

#[tokio::test]
async fn test_exploration_round_trips_through_repository() {
    let dir = tempfile::tempdir().unwrap();
    let repository = JsonRepository::new(dir.path()).unwrap();
    let mut engine = CrawlEngine::new(site().into_driver(), &fast_config())
        .with_repository(Box::new(repository.clone()));
    let mut decisions = ScriptedDecisionMaker::new(vec![
        ActionDecision::input("text_input_1", "rust"),
        // Every scan numbers elements afresh; "Continue" is button_3 on the second scan
        ActionDecision::click("button_3"),
    ]);

    let exploration = engine.explore(HOME, &mut decisions).await;

    let saved: CrawlGraph = repository.load_graph(HOME).unwrap().unwrap();
    assert_eq!(saved, exploration.graph);
    assert_eq!(saved.state_count(), 3);
    assert_eq!(saved.edges()[1].action.decision, ActionDecision::click("button_3"));
    assert_eq!(saved.state("state_3").unwrap().url, NEXT);
}
