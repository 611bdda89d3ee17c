//! Storage module for persisting crawl data
//!
//! This module handles persistence of crawl results:
//! - One JSON document per captured page
//! - One JSON document per crawl graph, overwritten at each checkpoint

mod json;
mod traits;

pub use json::JsonRepository;
pub use traits::{CrawlRepository, StorageError, StorageResult};

use std::path::Path;

/// Opens the JSON repository rooted at `path`
///
/// # Arguments
///
/// * `path` - Data directory; created if missing
///
/// # Returns
///
/// * `Ok(JsonRepository)` - Repository ready for use
/// * `Err(StorageError)` - The directory layout could not be created
pub fn open_repository(path: &Path) -> StorageResult<JsonRepository> {
    JsonRepository::new(path)
}
