//! Page driver trait and error types
//!
//! The crawl engine talks to a page only through [`PageDriver`]. A driver
//! owns one live page at a time and is driven by a single task, so every
//! method takes `&mut self`.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors reported by a page driver
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Timed out during {operation}")]
    Timeout { operation: String },

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Interaction failed: {0}")]
    Interaction(String),

    #[error("Script failed: {0}")]
    Script(String),

    #[error("Not supported by this driver: {0}")]
    Unsupported(&'static str),

    #[error("Driver setup failed: {0}")]
    Setup(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DriverError {
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// Returns true for errors worth retrying
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }
}

/// Result type for driver operations
pub type DriverResult<T> = Result<T, DriverError>;

/// Opaque reference to an element of the current page
///
/// Handles are only meaningful to the driver that issued them and only
/// until the next navigation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle(String);

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Element bounding box in CSS pixels
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Browser window dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

/// Scroll destination
#[derive(Debug, Clone, PartialEq)]
pub enum ScrollPosition {
    /// Absolute vertical offset
    Offset(i64),
    /// Bring this element into view
    Element(ElementHandle),
}

/// Interface to a live page
#[async_trait]
pub trait PageDriver: Send {
    /// Loads `url` into the page
    async fn navigate(&mut self, url: &str) -> DriverResult<()>;

    /// URL of the current document, after redirects
    async fn current_url(&mut self) -> DriverResult<String>;

    async fn title(&mut self) -> DriverResult<String>;

    /// Waits until the document reports it is fully loaded
    ///
    /// Returns `DriverError::Timeout` if readiness is not reached within `timeout`.
    async fn wait_document_ready(&mut self, timeout: Duration) -> DriverResult<()>;

    /// Finds every element matching a CSS selector, in document order
    async fn find(&mut self, selector: &str) -> DriverResult<Vec<ElementHandle>>;

    async fn get_attribute(
        &mut self,
        element: &ElementHandle,
        name: &str,
    ) -> DriverResult<Option<String>>;

    /// Lowercase tag name of the element
    async fn tag_name(&mut self, element: &ElementHandle) -> DriverResult<String>;

    /// Visible text content of the element
    async fn text(&mut self, element: &ElementHandle) -> DriverResult<String>;

    async fn location_and_size(&mut self, element: &ElementHandle) -> DriverResult<Rect>;

    async fn click(&mut self, element: &ElementHandle) -> DriverResult<()>;

    async fn send_keys(&mut self, element: &ElementHandle, text: &str) -> DriverResult<()>;

    async fn hover(&mut self, element: &ElementHandle) -> DriverResult<()>;

    async fn scroll_to(&mut self, position: &ScrollPosition) -> DriverResult<()>;

    /// Runs a script in the page, returning its JSON result
    ///
    /// Elements in `args` are exposed to the script as `arguments[i]`.
    async fn execute_script(
        &mut self,
        script: &str,
        args: &[ElementHandle],
    ) -> DriverResult<serde_json::Value>;

    /// Writes a PNG of the current viewport to `path`
    async fn capture_screenshot(&mut self, path: &Path) -> DriverResult<()>;

    async fn window_size(&mut self) -> DriverResult<WindowSize>;

    async fn set_window_size(&mut self, size: WindowSize) -> DriverResult<()>;
}
