//! In-memory page driver over a scripted site
//!
//! `MemoryDriver` serves pages from a [`MemorySite`] and fakes the parts of
//! a browser the crawler relies on: document readiness, layout, computed
//! styles, scrolling and lazily growing documents. Behavior is driven by
//! plain HTML attributes:
//!
//! - `data-rect="x,y,w,h"` sets an element's bounding box
//! - `style="display:none"`, `hidden`, `data-position="fixed"` feed the style script
//! - `data-navigate="<url>"` makes a click navigate
//! - `data-fails` makes any interaction with the element fail
//! - `<body data-height="...">` sets the document height

use crate::driver::document::StaticDocument;
use crate::driver::scripts;
use crate::driver::traits::{
    DriverError, DriverResult, ElementHandle, PageDriver, Rect, ScrollPosition, WindowSize,
};
use crate::url::resolve_link;
use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Pages and scripted misbehavior served by a [`MemoryDriver`]
#[derive(Debug, Clone, Default)]
pub struct MemorySite {
    pages: HashMap<String, String>,
    navigation_timeouts: HashMap<String, u32>,
    readiness_timeouts: HashMap<String, u32>,
    failures: HashMap<String, String>,
    heights: HashMap<String, Vec<i64>>,
    failing_selectors: HashSet<String>,
    scripts_disabled: bool,
}

impl MemorySite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// The next `times` navigations to `url` time out
    pub fn timeout_on(mut self, url: &str, times: u32) -> Self {
        self.navigation_timeouts.insert(url.to_string(), times);
        self
    }

    /// The next `times` readiness waits on `url` time out
    pub fn stall_on(mut self, url: &str, times: u32) -> Self {
        self.readiness_timeouts.insert(url.to_string(), times);
        self
    }

    /// Navigations to `url` fail with a non-timeout error
    pub fn fail_on(mut self, url: &str, message: &str) -> Self {
        self.failures.insert(url.to_string(), message.to_string());
        self
    }

    /// Document height of `url` grows through `heights`, one step per scroll to the bottom
    pub fn growing_height(mut self, url: &str, heights: Vec<i64>) -> Self {
        self.heights.insert(url.to_string(), heights);
        self
    }

    /// Queries with exactly this selector fail on every page
    pub fn failing_selector(mut self, selector: &str) -> Self {
        self.failing_selectors.insert(selector.to_string());
        self
    }

    /// Script execution reports `Unsupported`, like a static driver
    pub fn without_scripts(mut self) -> Self {
        self.scripts_disabled = true;
        self
    }

    pub fn into_driver(self) -> MemoryDriver {
        MemoryDriver::new(self)
    }
}

/// Page driver backed by a [`MemorySite`]
#[derive(Debug)]
pub struct MemoryDriver {
    site: MemorySite,
    current: Option<StaticDocument>,
    values: HashMap<ElementHandle, String>,
    navigations: Vec<String>,
    clicks: Vec<ElementHandle>,
    hovered: Option<ElementHandle>,
    screenshots: Vec<PathBuf>,
    scroll_offset: i64,
    growth_step: usize,
    window: WindowSize,
}

impl MemoryDriver {
    pub fn new(site: MemorySite) -> Self {
        Self {
            site,
            current: None,
            values: HashMap::new(),
            navigations: Vec::new(),
            clicks: Vec::new(),
            hovered: None,
            screenshots: Vec::new(),
            scroll_offset: 0,
            growth_step: 0,
            window: WindowSize {
                width: 1280,
                height: 800,
            },
        }
    }

    /// Every navigation attempted, in order, including failed ones
    pub fn navigations(&self) -> &[String] {
        &self.navigations
    }

    pub fn navigation_count(&self, url: &str) -> usize {
        self.navigations.iter().filter(|u| *u == url).count()
    }

    pub fn clicks(&self) -> &[ElementHandle] {
        &self.clicks
    }

    pub fn hovered(&self) -> Option<&ElementHandle> {
        self.hovered.as_ref()
    }

    pub fn screenshots(&self) -> &[PathBuf] {
        &self.screenshots
    }

    pub fn scroll_offset(&self) -> i64 {
        self.scroll_offset
    }

    fn document(&self) -> DriverResult<&StaticDocument> {
        self.current
            .as_ref()
            .ok_or_else(|| DriverError::Interaction("No page loaded".to_string()))
    }

    fn ensure_interactive(&self, element: &ElementHandle) -> DriverResult<()> {
        if self.document()?.attribute(element, "data-fails")?.is_some() {
            return Err(DriverError::Interaction(format!(
                "Element {} is not interactable",
                element.as_str()
            )));
        }
        Ok(())
    }

    fn document_height(&self) -> DriverResult<i64> {
        let doc = self.document()?;
        if let Some(heights) = self.site.heights.get(doc.url()) {
            if let Some(last) = heights.last() {
                return Ok(*heights.get(self.growth_step).unwrap_or(last));
            }
        }

        let declared = doc
            .find("body[data-height]")?
            .first()
            .map(|body| doc.attribute(body, "data-height"))
            .transpose()?
            .flatten()
            .and_then(|h| h.parse().ok());
        Ok(declared.unwrap_or(i64::from(self.window.height)))
    }

    fn rect_of(&self, element: &ElementHandle) -> DriverResult<Rect> {
        let doc = self.document()?;
        if let Some(rect_attr) = doc.attribute(element, "data-rect")? {
            let parts: Vec<f64> = rect_attr
                .split(',')
                .filter_map(|p| p.trim().parse().ok())
                .collect();
            if let [x, y, width, height] = parts[..] {
                return Ok(Rect {
                    x,
                    y,
                    width,
                    height,
                });
            }
        }

        let index = StaticDocument::index_of(element)
            .ok_or_else(|| DriverError::ElementNotFound(element.as_str().to_string()))?;
        Ok(Rect {
            x: 0.0,
            y: index as f64 * 40.0,
            width: 200.0,
            height: 30.0,
        })
    }

    fn element_style(&self, element: &ElementHandle) -> DriverResult<serde_json::Value> {
        let doc = self.document()?;
        let rect = self.rect_of(element)?;
        let inline = parse_inline_style(doc.attribute(element, "style")?.as_deref());

        let display = if doc.attribute(element, "hidden")?.is_some() {
            "none".to_string()
        } else {
            inline.get("display").cloned().unwrap_or_else(|| "block".to_string())
        };
        let position = doc
            .attribute(element, "data-position")?
            .or_else(|| inline.get("position").cloned())
            .unwrap_or_else(|| "static".to_string());

        Ok(json!({
            "connected": true,
            "display": display,
            "visibility": inline.get("visibility").cloned().unwrap_or_else(|| "visible".to_string()),
            "opacity": inline.get("opacity").cloned().unwrap_or_else(|| "1".to_string()),
            "position": position,
            "width": rect.width,
            "height": rect.height,
            "top": rect.y - self.scroll_offset as f64,
            "left": rect.x,
            "viewport_width": self.window.width,
            "viewport_height": self.window.height,
        }))
    }
}

fn parse_inline_style(style: Option<&str>) -> HashMap<String, String> {
    style
        .unwrap_or_default()
        .split(';')
        .filter_map(|declaration| {
            let (property, value) = declaration.split_once(':')?;
            Some((
                property.trim().to_ascii_lowercase(),
                value.trim().to_ascii_lowercase(),
            ))
        })
        .collect()
}

#[async_trait]
impl PageDriver for MemoryDriver {
    async fn navigate(&mut self, url: &str) -> DriverResult<()> {
        self.navigations.push(url.to_string());

        if let Some(remaining) = self.site.navigation_timeouts.get_mut(url) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(DriverError::timeout(format!("navigate to {}", url)));
            }
        }

        if let Some(message) = self.site.failures.get(url) {
            return Err(DriverError::Navigation {
                url: url.to_string(),
                message: message.clone(),
            });
        }

        let html = self
            .site
            .pages
            .get(url)
            .ok_or_else(|| DriverError::Navigation {
                url: url.to_string(),
                message: "404 Not Found".to_string(),
            })?;

        tracing::trace!("Memory driver loaded {}", url);
        self.current = Some(StaticDocument::new(url, html.clone()));
        self.values.clear();
        self.hovered = None;
        self.scroll_offset = 0;
        self.growth_step = 0;
        Ok(())
    }

    async fn current_url(&mut self) -> DriverResult<String> {
        Ok(self.document()?.url().to_string())
    }

    async fn title(&mut self) -> DriverResult<String> {
        Ok(self.document()?.title())
    }

    async fn wait_document_ready(&mut self, _timeout: Duration) -> DriverResult<()> {
        let url = self.document()?.url().to_string();
        if let Some(remaining) = self.site.readiness_timeouts.get_mut(&url) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(DriverError::timeout(format!("document ready on {}", url)));
            }
        }
        Ok(())
    }

    async fn find(&mut self, selector: &str) -> DriverResult<Vec<ElementHandle>> {
        if self.site.failing_selectors.contains(selector) {
            return Err(DriverError::Script(format!("query '{}' failed", selector)));
        }
        self.document()?.find(selector)
    }

    async fn get_attribute(
        &mut self,
        element: &ElementHandle,
        name: &str,
    ) -> DriverResult<Option<String>> {
        if name == "value" {
            if let Some(value) = self.values.get(element) {
                return Ok(Some(value.clone()));
            }
        }
        self.document()?.attribute(element, name)
    }

    async fn tag_name(&mut self, element: &ElementHandle) -> DriverResult<String> {
        self.document()?.tag_name(element)
    }

    async fn text(&mut self, element: &ElementHandle) -> DriverResult<String> {
        self.document()?.text(element)
    }

    async fn location_and_size(&mut self, element: &ElementHandle) -> DriverResult<Rect> {
        self.rect_of(element)
    }

    async fn click(&mut self, element: &ElementHandle) -> DriverResult<()> {
        self.ensure_interactive(element)?;
        let doc = self.document()?;

        let target = match doc.attribute(element, "data-navigate")? {
            Some(target) => Some(target),
            None if doc.tag_name(element)? == "a" => doc.attribute(element, "href")?,
            None => None,
        };
        let base = Url::parse(doc.url()).ok();

        self.clicks.push(element.clone());
        match (target, base) {
            (Some(href), Some(base)) => match resolve_link(&href, &base) {
                Some(url) => self.navigate(&url).await,
                None => Ok(()),
            },
            _ => Ok(()),
        }
    }

    async fn send_keys(&mut self, element: &ElementHandle, text: &str) -> DriverResult<()> {
        self.ensure_interactive(element)?;
        self.values.insert(element.clone(), text.to_string());
        Ok(())
    }

    async fn hover(&mut self, element: &ElementHandle) -> DriverResult<()> {
        self.ensure_interactive(element)?;
        self.hovered = Some(element.clone());
        Ok(())
    }

    async fn scroll_to(&mut self, position: &ScrollPosition) -> DriverResult<()> {
        let height = self.document_height()?;
        let offset = match position {
            ScrollPosition::Offset(offset) => *offset,
            ScrollPosition::Element(element) => self.rect_of(element)?.y as i64,
        };

        if offset >= height {
            self.growth_step += 1;
        }
        self.scroll_offset = offset.clamp(0, height);
        Ok(())
    }

    async fn execute_script(
        &mut self,
        script: &str,
        args: &[ElementHandle],
    ) -> DriverResult<serde_json::Value> {
        if self.site.scripts_disabled {
            return Err(DriverError::Unsupported("script execution"));
        }

        match script {
            scripts::DOCUMENT_HEIGHT => Ok(json!(self.document_height()?)),
            scripts::DOCUMENT_WIDTH => Ok(json!(self.window.width)),
            scripts::SCROLL_OFFSET => Ok(json!(self.scroll_offset)),
            scripts::ELEMENT_STYLE => {
                let element = args
                    .first()
                    .ok_or_else(|| DriverError::Script("Missing element argument".to_string()))?;
                self.element_style(element)
            }
            _ => Err(DriverError::Script("Unknown script".to_string())),
        }
    }

    async fn capture_screenshot(&mut self, path: &Path) -> DriverResult<()> {
        self.document()?;
        self.screenshots.push(path.to_path_buf());
        Ok(())
    }

    async fn window_size(&mut self) -> DriverResult<WindowSize> {
        Ok(self.window)
    }

    async fn set_window_size(&mut self, size: WindowSize) -> DriverResult<()> {
        self.window = size;
        Ok(())
    }
}
