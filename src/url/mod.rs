//! URL handling module
//!
//! This module provides link resolution, URL normalization and domain
//! extraction for the crawl frontier.

mod domain;
mod normalize;

pub use domain::{extract_domain, same_domain};
pub use normalize::{normalize_url, resolve_link};
