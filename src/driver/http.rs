//! Static HTML page driver over HTTP
//!
//! Fetches pages with `reqwest` and answers DOM queries from the returned
//! HTML. There is no script engine and no layout, so script execution,
//! geometry, hover and screenshots report `DriverError::Unsupported`.
//! Clicking a link follows it.

use crate::config::DriverConfig;
use crate::driver::document::StaticDocument;
use crate::driver::traits::{
    DriverError, DriverResult, ElementHandle, PageDriver, Rect, ScrollPosition, WindowSize,
};
use crate::url::resolve_link;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Builds an HTTP client configured for page fetching
///
/// # Arguments
///
/// * `config` - Driver configuration (user agent and request timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Configured HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &DriverConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Page driver that fetches static HTML
pub struct HttpPageDriver {
    client: Client,
    current: Option<StaticDocument>,
    values: HashMap<ElementHandle, String>,
    window: WindowSize,
}

impl HttpPageDriver {
    pub fn new(config: &DriverConfig) -> DriverResult<Self> {
        let client =
            build_http_client(config).map_err(|e| DriverError::Setup(e.to_string()))?;
        Ok(Self::with_client(
            client,
            WindowSize {
                width: config.viewport_width,
                height: config.viewport_height,
            },
        ))
    }

    pub fn with_client(client: Client, window: WindowSize) -> Self {
        Self {
            client,
            current: None,
            values: HashMap::new(),
            window,
        }
    }

    fn document(&self) -> DriverResult<&StaticDocument> {
        self.current
            .as_ref()
            .ok_or_else(|| DriverError::Interaction("No page loaded".to_string()))
    }
}

fn classify_request_error(url: &str, error: reqwest::Error) -> DriverError {
    if error.is_timeout() {
        DriverError::timeout(format!("request to {}", url))
    } else {
        DriverError::Navigation {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl PageDriver for HttpPageDriver {
    async fn navigate(&mut self, url: &str) -> DriverResult<()> {
        tracing::debug!("Fetching {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_request_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DriverError::Navigation {
                url: url.to_string(),
                message: format!("HTTP status {}", status.as_u16()),
            });
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.contains("text/html") {
            return Err(DriverError::Navigation {
                url: url.to_string(),
                message: format!("Unsupported content type '{}'", content_type),
            });
        }

        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| classify_request_error(url, e))?;

        self.current = Some(StaticDocument::new(final_url, body));
        self.values.clear();
        Ok(())
    }

    async fn current_url(&mut self) -> DriverResult<String> {
        Ok(self.document()?.url().to_string())
    }

    async fn title(&mut self) -> DriverResult<String> {
        Ok(self.document()?.title())
    }

    async fn wait_document_ready(&mut self, _timeout: Duration) -> DriverResult<()> {
        // A fetched document is complete once its body has been read
        self.document().map(|_| ())
    }

    async fn find(&mut self, selector: &str) -> DriverResult<Vec<ElementHandle>> {
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

    async fn location_and_size(&mut self, _element: &ElementHandle) -> DriverResult<Rect> {
        Err(DriverError::Unsupported("layout"))
    }

    async fn click(&mut self, element: &ElementHandle) -> DriverResult<()> {
        let doc = self.document()?;
        if doc.tag_name(element)? != "a" {
            return Err(DriverError::Unsupported("clicking non-link elements"));
        }

        let href = doc
            .attribute(element, "href")?
            .ok_or_else(|| DriverError::Interaction("Link has no href".to_string()))?;
        let base = Url::parse(doc.url()).map_err(|e| DriverError::Navigation {
            url: doc.url().to_string(),
            message: e.to_string(),
        })?;
        let target = resolve_link(&href, &base)
            .ok_or_else(|| DriverError::Interaction(format!("Link '{}' is not navigable", href)))?;

        self.navigate(&target).await
    }

    async fn send_keys(&mut self, element: &ElementHandle, text: &str) -> DriverResult<()> {
        self.document()?.tag_name(element)?;
        self.values.insert(element.clone(), text.to_string());
        Ok(())
    }

    async fn hover(&mut self, _element: &ElementHandle) -> DriverResult<()> {
        Err(DriverError::Unsupported("hover"))
    }

    async fn scroll_to(&mut self, _position: &ScrollPosition) -> DriverResult<()> {
        Err(DriverError::Unsupported("scrolling"))
    }

    async fn execute_script(
        &mut self,
        _script: &str,
        _args: &[ElementHandle],
    ) -> DriverResult<serde_json::Value> {
        Err(DriverError::Unsupported("script execution"))
    }

    async fn capture_screenshot(&mut self, _path: &Path) -> DriverResult<()> {
        Err(DriverError::Unsupported("screenshots"))
    }

    async fn window_size(&mut self) -> DriverResult<WindowSize> {
        Ok(self.window)
    }

    async fn set_window_size(&mut self, size: WindowSize) -> DriverResult<()> {
        self.window = size;
        Ok(())
    }
}
