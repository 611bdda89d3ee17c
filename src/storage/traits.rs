//! Storage traits and error types
//!
//! This module defines the repository interface for persisting pages and
//! crawl graphs, and its error type.

use crate::graph::{CrawlGraph, GraphError, Page};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Stored graph is inconsistent: {0}")]
    InvalidGraph(#[from] GraphError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for crawl repositories
///
/// Saving overwrites any earlier document with the same key, so a graph
/// saved at each checkpoint always holds the latest snapshot. Loading a
/// missing document is not an error.
pub trait CrawlRepository: Send + Sync {
    /// Saves a page under its page id
    fn save_page(&self, page: &Page) -> StorageResult<()>;

    /// Loads a page by id
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Page))` - The stored page
    /// * `Ok(None)` - No page with this id was saved
    /// * `Err(StorageError)` - The page exists but could not be read
    fn load_page(&self, page_id: &str) -> StorageResult<Option<Page>>;

    /// Saves a graph under the key derived from its start URL
    fn save_graph(&self, graph: &CrawlGraph) -> StorageResult<()>;

    /// Loads the graph of the crawl started from `start_url`
    ///
    /// Loaded graphs are checked against the graph invariants.
    fn load_graph(&self, start_url: &str) -> StorageResult<Option<CrawlGraph>>;
}
