//! Static HTML documents addressed through element handles
//!
//! Both bundled drivers keep the current page as raw HTML and answer DOM
//! queries by parsing it with `scraper`. Handles are `node-<i>`, where `i`
//! is the element's position among all elements in document order, so a
//! handle stays valid for as long as the document text does not change.

use crate::driver::traits::{DriverError, DriverResult, ElementHandle};
use scraper::{ElementRef, Html, Selector};

/// A loaded page: its final URL and HTML source
#[derive(Debug, Clone)]
pub struct StaticDocument {
    url: String,
    html: String,
}

impl StaticDocument {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Text of the `<title>` element, or an empty string
    pub fn title(&self) -> String {
        let document = Html::parse_document(&self.html);
        let Ok(selector) = Selector::parse("title") else {
            return String::new();
        };

        document
            .select(&selector)
            .next()
            .map(|element| collapse_whitespace(&element.text().collect::<String>()))
            .unwrap_or_default()
    }

    /// Handles of all elements matching `selector`, in document order
    pub fn find(&self, selector: &str) -> DriverResult<Vec<ElementHandle>> {
        let selector = parse_selector(selector)?;
        let document = Html::parse_document(&self.html);
        let all = parse_selector("*")?;

        let mut handles = Vec::new();
        for (index, element) in document.select(&all).enumerate() {
            if selector.matches(&element) {
                handles.push(ElementHandle::new(format!("node-{}", index)));
            }
        }
        Ok(handles)
    }

    pub fn attribute(&self, handle: &ElementHandle, name: &str) -> DriverResult<Option<String>> {
        self.with_element(handle, |element| {
            element.value().attr(name).map(str::to_string)
        })
    }

    pub fn tag_name(&self, handle: &ElementHandle) -> DriverResult<String> {
        self.with_element(handle, |element| element.value().name().to_ascii_lowercase())
    }

    /// Text content with whitespace runs collapsed
    pub fn text(&self, handle: &ElementHandle) -> DriverResult<String> {
        self.with_element(handle, |element| {
            collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
        })
    }

    /// Document-order index encoded in a handle
    pub fn index_of(handle: &ElementHandle) -> Option<usize> {
        handle.as_str().strip_prefix("node-")?.parse().ok()
    }

    fn with_element<T>(
        &self,
        handle: &ElementHandle,
        f: impl FnOnce(ElementRef<'_>) -> T,
    ) -> DriverResult<T> {
        let index = Self::index_of(handle)
            .ok_or_else(|| DriverError::ElementNotFound(handle.as_str().to_string()))?;
        let document = Html::parse_document(&self.html);
        let all = parse_selector("*")?;

        document
            .select(&all)
            .nth(index)
            .map(f)
            .ok_or_else(|| DriverError::ElementNotFound(handle.as_str().to_string()))
    }
}

fn parse_selector(selector: &str) -> DriverResult<Selector> {
    Selector::parse(selector)
        .map_err(|e| DriverError::Script(format!("Invalid selector '{}': {:?}", selector, e)))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
