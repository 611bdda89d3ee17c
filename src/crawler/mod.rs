//! Crawler module for page visiting and exploration
//!
//! This module contains the core crawling logic, including:
//! - Page visits with bounded retries
//! - Interactive element scanning and link extraction
//! - BFS and decision-driven crawl orchestration

mod engine;
mod scanner;
mod visitor;

pub use engine::{ActionError, CrawlEngine, Exploration, FrontierEntry, StopReason};
pub use scanner::{style_is_visible, ElementScan, ElementScanner};
pub use visitor::{PageVisitor, VisitError, VisitReport};

use crate::config::{Config, CrawlMode, DecisionMakerKind};
use crate::decision::{HumanDecisionMaker, LinkVisitorDecisionMaker};
use crate::driver::HttpPageDriver;
use crate::graph::CrawlGraph;
use crate::output::{CrawlReporter, FanoutReporter, LogReporter, MarkdownReporter, OutputResult};
use crate::storage::open_repository;
use crate::CartographerError;
use std::path::Path;
use std::sync::Arc;

/// Logs and discards a reporter failure
pub(crate) fn notify(result: OutputResult<()>) {
    if let Err(e) = result {
        tracing::warn!("Reporter failed: {}", e);
    }
}

/// Runs a complete crawl described by a configuration
///
/// This is the main entry point used by the binary. It will:
/// 1. Build the HTTP page driver
/// 2. Open the JSON repository under the data directory
/// 3. Open the markdown crawl log
/// 4. Run BFS or interactive exploration, per the configured mode
///
/// # Arguments
///
/// * `config` - The validated configuration
///
/// # Returns
///
/// * `Ok(CrawlGraph)` - The explored graph (also saved to the repository)
/// * `Err(CartographerError)` - Setup failed before crawling started
pub async fn run(config: &Config) -> Result<CrawlGraph, CartographerError> {
    let driver = HttpPageDriver::new(&config.driver)?;
    let repository = open_repository(Path::new(&config.output.data_dir))?;
    let markdown = MarkdownReporter::create(Path::new(&config.output.log_path))?;

    let reporter: Arc<dyn CrawlReporter> = Arc::new(FanoutReporter::new(vec![
        Box::new(LogReporter),
        Box::new(markdown),
    ]));

    let mut engine = CrawlEngine::new(driver, &config.crawler)
        .with_reporter(reporter)
        .with_repository(Box::new(repository));

    if config.output.capture_screenshots {
        let dir = Path::new(&config.output.data_dir).join("screenshots");
        std::fs::create_dir_all(&dir)?;
        engine = engine.with_screenshot_dir(dir);
    }

    let start_url = config.crawl.start_url.as_str();
    let graph = match config.crawl.mode {
        CrawlMode::Bfs => engine.crawl_bfs(start_url).await,
        CrawlMode::Interactive => {
            let exploration = match config.crawl.decision_maker {
                DecisionMakerKind::Human => {
                    let stdin = std::io::stdin();
                    let mut human = HumanDecisionMaker::new(stdin.lock(), std::io::stdout());
                    engine.explore(start_url, &mut human).await
                }
                DecisionMakerKind::Links => {
                    let mut links = LinkVisitorDecisionMaker::default();
                    engine.explore(start_url, &mut links).await
                }
            };
            tracing::info!("Exploration stopped: {:?}", exploration.stop_reason);
            exploration.graph
        }
    };

    Ok(graph)
}
