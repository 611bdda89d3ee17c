//! Page records: one per unique URL visited

use crate::graph::element::{ElementType, InteractiveElement};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Derives a deterministic page id from a URL
///
/// The id is `page_` followed by the first 16 hex characters of the
/// SHA-256 digest of the URL text.
pub fn page_id_for(url: &str) -> String {
    format!("page_{}", short_digest(url))
}

/// First 16 hex characters of the SHA-256 digest of `text`
pub(crate) fn short_digest(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(16);
    digest
}

/// Facts about a page captured at first visit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub url: String,
    pub title: String,
    pub timestamp: DateTime<Utc>,
    pub total_width: u32,
    pub total_height: u32,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub load_time_ms: u64,
}

/// One viewport-sized capture of a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Screenshot {
    pub screenshot_id: String,
    pub path: String,
    /// 1-based section index from the top of the page
    pub section_number: u32,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub scroll_position: i64,
}

/// A unique URL visited during a crawl
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub page_id: String,
    pub metadata: PageMetadata,
    pub screenshots: Vec<Screenshot>,
    pub interactive_elements: Vec<InteractiveElement>,
    /// Outbound links in discovery order
    pub links: Vec<String>,
}

impl Page {
    /// Creates a page, deriving its id from the metadata URL
    pub fn new(
        metadata: PageMetadata,
        screenshots: Vec<Screenshot>,
        interactive_elements: Vec<InteractiveElement>,
        links: Vec<String>,
    ) -> Self {
        Self {
            page_id: page_id_for(&metadata.url),
            metadata,
            screenshots,
            interactive_elements,
            links,
        }
    }

    pub fn url(&self) -> &str {
        &self.metadata.url
    }

    pub fn title(&self) -> &str {
        &self.metadata.title
    }

    /// Returns the elements of a single category, in scan order
    pub fn elements_of_type(&self, element_type: ElementType) -> Vec<&InteractiveElement> {
        self.interactive_elements
            .iter()
            .filter(|e| e.element_type == element_type)
            .collect()
    }

    /// Looks up an element by id
    pub fn element(&self, element_id: &str) -> Option<&InteractiveElement> {
        self.interactive_elements
            .iter()
            .find(|e| e.element_id == element_id)
    }

    /// Number of viewport sections the page spans
    pub fn section_count(&self) -> u32 {
        let viewport = self.metadata.viewport_height.max(1);
        self.metadata.total_height.div_ceil(viewport).max(1)
    }
}
