//! ui-cartographer main entry point
//!
//! This is the command-line interface for the ui-cartographer site explorer.

use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use ui_cartographer::config::{load_config_with_hash, Config, CrawlMode};

/// ui-cartographer: an interactive site cartographer
///
/// Explores a site from a start URL, recording its pages, their interactive
/// elements and the actions that lead between page states as a graph.
#[derive(Parser, Debug)]
#[command(name = "ui-cartographer")]
#[command(version = "1.0.0")]
#[command(about = "An interactive site cartographer", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Override the crawl mode from the configuration
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics of the saved graph for the start URL and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Bfs,
    Interactive,
}

impl From<ModeArg> for CrawlMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Bfs => CrawlMode::Bfs,
            ModeArg::Interactive => CrawlMode::Interactive,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(mode) = cli.mode {
        config.crawl.mode = mode.into();
    }

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ui_cartographer=info,warn"),
            1 => EnvFilter::new("ui_cartographer=debug,info"),
            2 => EnvFilter::new("ui_cartographer=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Handles the --dry-run mode: prints the validated configuration
fn handle_dry_run(config: &Config) {
    println!("=== ui-cartographer Dry Run ===\n");

    println!("Crawl:");
    println!("  Start URL: {}", config.crawl.start_url);
    println!("  Mode: {:?}", config.crawl.mode);
    if config.crawl.mode == CrawlMode::Interactive {
        println!("  Decision maker: {:?}", config.crawl.decision_maker);
    }

    println!("\nCrawler:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Max retries: {}", config.crawler.max_retries);
    println!("  Retry delay: {}ms", config.crawler.retry_delay_ms);
    println!("  Page load timeout: {}ms", config.crawler.page_load_timeout_ms);
    println!("  Scroll settle: {}ms", config.crawler.scroll_settle_ms);
    println!("  Action settle: {}ms", config.crawler.action_settle_ms);
    println!("  Max scroll rounds: {}", config.crawler.max_scroll_rounds);
    println!("  Checkpoint every: {} pages", config.crawler.checkpoint_interval);
    println!("  Stay on domain: {}", config.crawler.stay_on_domain);

    println!("\nDriver:");
    println!("  User agent: {}", config.driver.user_agent);
    println!("  Request timeout: {}s", config.driver.request_timeout_secs);
    println!(
        "  Viewport: {}x{}",
        config.driver.viewport_width, config.driver.viewport_height
    );

    println!("\nOutput:");
    println!("  Data directory: {}", config.output.data_dir);
    println!("  Crawl log: {}", config.output.log_path);
    println!("  Screenshots: {}", config.output.capture_screenshots);

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: prints statistics of the saved graph
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use ui_cartographer::output::{print_statistics, CrawlStatistics};
    use ui_cartographer::storage::{open_repository, CrawlRepository};

    println!("Data directory: {}\n", config.output.data_dir);

    let repository = open_repository(Path::new(&config.output.data_dir))?;
    let Some(graph) = repository.load_graph(&config.crawl.start_url)? else {
        return Err(format!("No saved graph for {}", config.crawl.start_url).into());
    };

    print_statistics(&CrawlStatistics::from_graph(&graph));
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Starting {:?} crawl of {}",
        config.crawl.mode,
        config.crawl.start_url
    );

    match ui_cartographer::crawler::run(config).await {
        Ok(graph) => {
            tracing::info!(
                "Crawl completed: {} pages, {} states, {} edges, {} failures",
                graph.page_count(),
                graph.state_count(),
                graph.edge_count(),
                graph.failures().len()
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
