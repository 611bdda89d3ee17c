//! Output module for crawl reporting and statistics
//!
//! This module handles:
//! - Reporting crawl events as they happen (tracing, markdown log)
//! - Computing and printing statistics of a saved crawl graph

mod log;
mod markdown;
pub mod stats;
mod traits;

pub use log::{FanoutReporter, LogReporter};
pub use markdown::{format_failure, format_progress, format_state, format_visit, MarkdownReporter};
pub use stats::{print_statistics, CrawlStatistics};
pub use traits::{CrawlReporter, OutputError, OutputResult, PageVisit};
