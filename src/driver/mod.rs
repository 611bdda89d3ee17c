//! Page drivers
//!
//! This module defines the [`PageDriver`] interface the crawler uses to load
//! and interact with pages, plus two implementations:
//! - [`MemoryDriver`]: serves a scripted in-memory site
//! - [`HttpPageDriver`]: fetches static HTML over HTTP

mod document;
mod http;
mod memory;
pub mod scripts;
mod traits;

pub use document::StaticDocument;
pub use http::{build_http_client, HttpPageDriver};
pub use memory::{MemoryDriver, MemorySite};
pub use traits::{
    DriverError, DriverResult, ElementHandle, PageDriver, Rect, ScrollPosition, WindowSize,
};
