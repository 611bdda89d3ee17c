//! Interactive element discovery
//!
//! The scanner first scrolls through the page so lazily loaded content is
//! materialized, then runs the selector of every element category and keeps
//! the elements that are effectively visible. Element ids come from
//! per-category counters that persist for the scanner's lifetime, so ids
//! are unique across a whole crawl but depend on discovery order.

use crate::config::CrawlerConfig;
use crate::driver::{scripts, DriverError, DriverResult, ElementHandle, PageDriver, ScrollPosition};
use crate::graph::{ElementLocation, ElementType, InteractiveElement, ScreenshotSection};
use crate::url::resolve_link;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;
use url::Url;

/// Elements found by one scan, grouped by category
pub type ElementScan = BTreeMap<ElementType, Vec<InteractiveElement>>;

/// Attributes copied onto element records when present
const RECORDED_ATTRIBUTES: [&str; 10] = [
    "id",
    "class",
    "name",
    "type",
    "href",
    "role",
    "aria-label",
    "placeholder",
    "value",
    "title",
];

const DEFAULT_VIEWPORT_HEIGHT: u32 = 800;

/// Finds interactive elements on the current page
#[derive(Debug)]
pub struct ElementScanner {
    scroll_settle: Duration,
    max_scroll_rounds: u32,
    counters: BTreeMap<ElementType, u32>,
    handles: HashMap<String, ElementHandle>,
}

impl ElementScanner {
    pub fn new(config: &CrawlerConfig) -> Self {
        Self {
            scroll_settle: config.scroll_settle(),
            max_scroll_rounds: config.max_scroll_rounds,
            counters: BTreeMap::new(),
            handles: HashMap::new(),
        }
    }

    /// Scans the current page for interactive elements
    ///
    /// Never fails: a category or element that cannot be read is skipped
    /// and logged, yielding a partial result.
    pub async fn scan<D: PageDriver + ?Sized>(&mut self, driver: &mut D) -> ElementScan {
        match self.materialize(driver).await {
            Ok(()) => {}
            Err(e) if e.is_unsupported() => {
                tracing::trace!("Skipping content materialization: {}", e)
            }
            Err(e) => tracing::warn!("Content materialization failed: {}", e),
        }

        let viewport_height = match driver.window_size().await {
            Ok(size) => size.height,
            Err(e) => {
                tracing::debug!("Window size unavailable ({}), assuming default", e);
                DEFAULT_VIEWPORT_HEIGHT
            }
        };
        let forms = form_membership(driver).await;

        self.handles.clear();
        let mut scan = ElementScan::new();

        for element_type in ElementType::all() {
            let found = match driver.find(element_type.selector()).await {
                Ok(found) => found,
                Err(e) => {
                    tracing::warn!("Failed to query {} elements: {}", element_type, e);
                    scan.insert(element_type, Vec::new());
                    continue;
                }
            };

            let mut elements = Vec::new();
            for handle in found {
                match is_visible(driver, &handle).await {
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(e) if e.is_unsupported() => {}
                    Err(e) => {
                        tracing::debug!("Visibility check failed for {:?}: {}", handle, e);
                        continue;
                    }
                }

                match self
                    .describe(driver, element_type, &handle, viewport_height, &forms)
                    .await
                {
                    Ok(element) => {
                        self.handles
                            .insert(element.element_id.clone(), handle.clone());
                        elements.push(element);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to read {} element: {}", element_type, e);
                    }
                }
            }

            scan.insert(element_type, elements);
        }

        tracing::debug!(
            "Scan found {} interactive elements",
            scan.values().map(Vec::len).sum::<usize>()
        );
        scan
    }

    /// Driver handle of an element from the most recent scan
    pub fn handle_for(&self, element_id: &str) -> Option<&ElementHandle> {
        self.handles.get(element_id)
    }

    /// Outbound links of the current page, resolved and deduplicated in discovery order
    pub async fn extract_links<D: PageDriver + ?Sized>(&self, driver: &mut D) -> Vec<String> {
        let base = match driver.current_url().await {
            Ok(url) => match Url::parse(&url) {
                Ok(base) => base,
                Err(e) => {
                    tracing::warn!("Cannot resolve links against '{}': {}", url, e);
                    return Vec::new();
                }
            },
            Err(e) => {
                tracing::warn!("Current URL unavailable: {}", e);
                return Vec::new();
            }
        };

        let anchors = match driver.find("a[href]").await {
            Ok(anchors) => anchors,
            Err(e) => {
                tracing::warn!("Failed to query links on {}: {}", base, e);
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        let mut links = Vec::new();
        for anchor in anchors {
            let href = match driver.get_attribute(&anchor, "href").await {
                Ok(Some(href)) => href,
                Ok(None) => continue,
                Err(e) => {
                    tracing::debug!("Failed to read href: {}", e);
                    continue;
                }
            };

            if let Some(link) = resolve_link(&href, &base) {
                if seen.insert(link.clone()) {
                    links.push(link);
                }
            }
        }
        links
    }

    /// Current values of form fields that carry an id
    pub async fn form_values<D: PageDriver + ?Sized>(
        &self,
        driver: &mut D,
    ) -> BTreeMap<String, String> {
        let fields = match driver.find("input, textarea, select").await {
            Ok(fields) => fields,
            Err(e) => {
                tracing::debug!("Failed to query form fields: {}", e);
                return BTreeMap::new();
            }
        };

        let mut values = BTreeMap::new();
        for field in fields {
            let id = match driver.get_attribute(&field, "id").await {
                Ok(Some(id)) if !id.is_empty() => id,
                _ => continue,
            };
            if let Ok(value) = driver.get_attribute(&field, "value").await {
                values.insert(id, value.unwrap_or_default());
            }
        }
        values
    }

    /// Scrolls to the bottom until the document height stops growing, then back to the top
    async fn materialize<D: PageDriver + ?Sized>(&self, driver: &mut D) -> DriverResult<()> {
        let mut height = document_height(driver).await?;

        for round in 1..=self.max_scroll_rounds {
            driver.scroll_to(&ScrollPosition::Offset(height)).await?;
            tokio::time::sleep(self.scroll_settle).await;

            let new_height = document_height(driver).await?;
            if new_height == height {
                break;
            }
            tracing::trace!(
                "Document grew from {} to {} (round {})",
                height,
                new_height,
                round
            );
            height = new_height;
        }

        driver.scroll_to(&ScrollPosition::Offset(0)).await
    }

    async fn describe<D: PageDriver + ?Sized>(
        &mut self,
        driver: &mut D,
        element_type: ElementType,
        handle: &ElementHandle,
        viewport_height: u32,
        forms: &HashMap<ElementHandle, String>,
    ) -> DriverResult<InteractiveElement> {
        let tag_name = driver.tag_name(handle).await?;
        let text = driver.text(handle).await?;

        let mut attributes = BTreeMap::new();
        for name in RECORDED_ATTRIBUTES {
            if let Some(value) = driver.get_attribute(handle, name).await? {
                attributes.insert(name.to_string(), value);
            }
        }
        let is_enabled = driver.get_attribute(handle, "disabled").await?.is_none();

        let location = match driver.location_and_size(handle).await {
            Ok(rect) => ElementLocation {
                x: rect.x.round() as i64,
                y: rect.y.round() as i64,
                width: rect.width.round() as i64,
                height: rect.height.round() as i64,
            },
            Err(e) if e.is_unsupported() => ElementLocation::default(),
            Err(e) => return Err(e),
        };

        let parent_form_id = match driver.get_attribute(handle, "form").await? {
            Some(form) => Some(form),
            None => forms.get(handle).cloned(),
        };

        let counter = self.counters.entry(element_type).or_insert(0);
        *counter += 1;

        Ok(InteractiveElement {
            element_id: format!("{}_{}", element_type.as_str(), counter),
            element_type,
            tag_name,
            text,
            location,
            screenshot_section: ScreenshotSection::for_location(&location, viewport_height),
            attributes,
            is_enabled,
            is_displayed: true,
            has_input_field: element_type.accepts_text(),
            parent_form_id,
        })
    }
}

async fn document_height<D: PageDriver + ?Sized>(driver: &mut D) -> DriverResult<i64> {
    let value = driver.execute_script(scripts::DOCUMENT_HEIGHT, &[]).await?;
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|h| h.round() as i64))
        .ok_or_else(|| DriverError::Script(format!("Document height is not a number: {}", value)))
}

async fn is_visible<D: PageDriver + ?Sized>(
    driver: &mut D,
    handle: &ElementHandle,
) -> DriverResult<bool> {
    let style = driver
        .execute_script(scripts::ELEMENT_STYLE, std::slice::from_ref(handle))
        .await?;
    Ok(style_is_visible(&style))
}

/// Maps every element inside an identified form to that form's id
async fn form_membership<D: PageDriver + ?Sized>(
    driver: &mut D,
) -> HashMap<ElementHandle, String> {
    let mut membership = HashMap::new();
    let Ok(forms) = driver.find("form[id]").await else {
        return membership;
    };

    for form in forms {
        let Ok(Some(id)) = driver.get_attribute(&form, "id").await else {
            continue;
        };
        let selector = format!("form[id=\"{}\"] *", id.replace('\\', "\\\\").replace('"', "\\\""));
        match driver.find(&selector).await {
            Ok(members) => {
                for member in members {
                    membership.entry(member).or_insert_with(|| id.clone());
                }
            }
            Err(e) => tracing::debug!("Failed to resolve members of form {}: {}", id, e),
        }
    }
    membership
}

/// Decides visibility from the facts returned by the element style script
///
/// An element is visible when it is connected, displayed, not hidden, not
/// fully transparent and has a non-zero size. Fixed and absolutely
/// positioned elements must also intersect the viewport.
pub fn style_is_visible(style: &Value) -> bool {
    let number = |key: &str| -> Option<f64> {
        match &style[key] {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    };
    let text = |key: &str| style[key].as_str().unwrap_or_default().to_ascii_lowercase();

    if !style["connected"].as_bool().unwrap_or(true) {
        return false;
    }
    if text("display") == "none" || text("visibility") == "hidden" {
        return false;
    }
    if number("opacity") == Some(0.0) {
        return false;
    }

    let width = number("width").unwrap_or(0.0);
    let height = number("height").unwrap_or(0.0);
    if width <= 0.0 || height <= 0.0 {
        return false;
    }

    let position = text("position");
    if position == "fixed" || position == "absolute" {
        let top = number("top").unwrap_or(0.0);
        let left = number("left").unwrap_or(0.0);
        let viewport_width = number("viewport_width").unwrap_or(f64::MAX);
        let viewport_height = number("viewport_height").unwrap_or(f64::MAX);

        let in_viewport = top < viewport_height
            && top + height > 0.0
            && left < viewport_width
            && left + width > 0.0;
        if !in_viewport {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::MemorySite;
    use serde_json::json;

    const URL: &str = "https://site.test/";

    const PAGE: &str = r#"<html><head><title>Form</title></head><body>
        <form id="signup">
            <input id="email" type="email" placeholder="Email">
            <input id="nick" type="text" value="anon">
            <button type="submit">Sign up</button>
        </form>
        <a href="/about">About</a>
        <a href="/about#team">Team</a>
        <a href="mailto:hi@site.test">Mail</a>
        <a href="https://other.test/x">Elsewhere</a>
        <button style="display:none">Ghost</button>
        <button data-rect="0,0,0,0">Flat</button>
        <button data-position="fixed" data-rect="0,5000,100,30">Offscreen</button>
        <button disabled>Off</button>
    </body></html>"#;

    fn config() -> CrawlerConfig {
        CrawlerConfig {
            scroll_settle_ms: 0,
            ..CrawlerConfig::default()
        }
    }

    #[test]
    fn test_style_visibility_rules() {
        let visible = json!({
            "connected": true, "display": "block", "visibility": "visible",
            "opacity": "1", "position": "static", "width": 10, "height": 10,
            "top": 0, "left": 0, "viewport_width": 1280, "viewport_height": 800
        });
        assert!(style_is_visible(&visible));

        let mut hidden = visible.clone();
        hidden["visibility"] = json!("hidden");
        assert!(!style_is_visible(&hidden));

        let mut transparent = visible.clone();
        transparent["opacity"] = json!("0");
        assert!(!style_is_visible(&transparent));

        let mut detached = visible.clone();
        detached["connected"] = json!(false);
        assert!(!style_is_visible(&detached));

        let mut fixed_below = visible.clone();
        fixed_below["position"] = json!("fixed");
        fixed_below["top"] = json!(900);
        assert!(!style_is_visible(&fixed_below));

        // Static elements below the fold still count
        let mut static_below = visible;
        static_below["top"] = json!(900);
        assert!(style_is_visible(&static_below));
    }

    #[tokio::test]
    async fn test_scan_filters_hidden_elements() {
        let mut driver = MemorySite::new().page(URL, PAGE).into_driver();
        driver.navigate(URL).await.unwrap();
        let mut scanner = ElementScanner::new(&config());

        let scan = scanner.scan(&mut driver).await;
        let buttons: Vec<&str> = scan[&ElementType::Button]
            .iter()
            .map(|b| b.text.as_str())
            .collect();
        assert_eq!(buttons, vec!["Sign up", "Off"]);
        assert_eq!(scan.len(), ElementType::all().len());
    }

    #[tokio::test]
    async fn test_failed_category_yields_partial_scan() {
        let mut driver = MemorySite::new()
            .page(URL, PAGE)
            .failing_selector(ElementType::Link.selector())
            .into_driver();
        driver.navigate(URL).await.unwrap();
        let mut scanner = ElementScanner::new(&config());

        let scan = scanner.scan(&mut driver).await;
        assert!(scan[&ElementType::Link].is_empty());
        assert_eq!(scan[&ElementType::Button].len(), 2);
        assert_eq!(scan[&ElementType::TextInput].len(), 2);
        assert_eq!(scan.len(), ElementType::all().len());
        assert!(scanner.handle_for("link_1").is_none());
    }

    #[tokio::test]
    async fn test_scan_records_element_details() {
        let mut driver = MemorySite::new().page(URL, PAGE).into_driver();
        driver.navigate(URL).await.unwrap();
        let mut scanner = ElementScanner::new(&config());

        let scan = scanner.scan(&mut driver).await;
        let inputs = &scan[&ElementType::TextInput];
        assert_eq!(inputs.len(), 2);

        let email = &inputs[0];
        assert_eq!(email.element_id, "text_input_1");
        assert_eq!(email.tag_name, "input");
        assert!(email.has_input_field);
        assert_eq!(email.parent_form_id.as_deref(), Some("signup"));
        assert_eq!(email.attributes.get("placeholder").map(String::as_str), Some("Email"));

        let off = scan[&ElementType::Button]
            .iter()
            .find(|b| b.text == "Off")
            .unwrap();
        assert!(!off.is_enabled);
        assert_eq!(off.parent_form_id, None);
    }

    #[tokio::test]
    async fn test_ids_persist_across_scans() {
        let mut driver = MemorySite::new().page(URL, PAGE).into_driver();
        driver.navigate(URL).await.unwrap();
        let mut scanner = ElementScanner::new(&config());

        let first = scanner.scan(&mut driver).await;
        let second = scanner.scan(&mut driver).await;
        assert_eq!(first[&ElementType::Link][0].element_id, "link_1");
        assert_eq!(second[&ElementType::Link][0].element_id, "link_5");

        // Only the latest scan's ids resolve
        assert!(scanner.handle_for("link_1").is_none());
        assert!(scanner.handle_for("link_5").is_some());
    }

    #[tokio::test]
    async fn test_extract_links() {
        let mut driver = MemorySite::new().page(URL, PAGE).into_driver();
        driver.navigate(URL).await.unwrap();
        let scanner = ElementScanner::new(&config());

        let links = scanner.extract_links(&mut driver).await;
        assert_eq!(
            links,
            vec![
                "https://site.test/about".to_string(),
                "https://other.test/x".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_form_values() {
        let mut driver = MemorySite::new().page(URL, PAGE).into_driver();
        driver.navigate(URL).await.unwrap();
        let scanner = ElementScanner::new(&config());

        let values = scanner.form_values(&mut driver).await;
        assert_eq!(values.get("nick").map(String::as_str), Some("anon"));
        assert_eq!(values.get("email").map(String::as_str), Some(""));
    }

    #[tokio::test(start_paused = true)]
    async fn test_materialize_scrolls_until_stable() {
        let mut driver = MemorySite::new()
            .page(URL, PAGE)
            .growing_height(URL, vec![1000, 1800, 2600])
            .into_driver();
        driver.navigate(URL).await.unwrap();
        let scanner = ElementScanner::new(&CrawlerConfig::default());

        let started = tokio::time::Instant::now();
        scanner.materialize(&mut driver).await.unwrap();
        assert_eq!(driver.scroll_offset(), 0);
        // Two growth rounds plus the round that sees a stable height
        assert!(started.elapsed() >= Duration::from_secs(6));
    }

    #[tokio::test]
    async fn test_scan_without_scripts_counts_everything_visible() {
        let mut driver = MemorySite::new()
            .page(URL, PAGE)
            .without_scripts()
            .into_driver();
        driver.navigate(URL).await.unwrap();
        let mut scanner = ElementScanner::new(&config());

        let scan = scanner.scan(&mut driver).await;
        assert_eq!(scan[&ElementType::Button].len(), 5);
    }
}
