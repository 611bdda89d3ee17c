//! Bounded-retry page visits
//!
//! A visit is `navigate` followed by a readiness wait. Timeouts from either
//! step are retried after a fixed delay; any other driver error fails the
//! visit at once. Failures are reported to the reporter exactly once.

use crate::config::CrawlerConfig;
use crate::crawler::notify;
use crate::driver::{DriverError, PageDriver};
use crate::output::CrawlReporter;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Outcome of a successful visit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitReport {
    /// Attempts used, including the successful one
    pub attempts: u32,

    /// Time from the successful navigation to document readiness
    pub load_time: Duration,
}

/// A page that could not be visited
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VisitError {
    #[error("Timed out loading {url} after {attempts} attempts")]
    TimedOut { url: String, attempts: u32 },

    #[error("Failed to load {url}: {message}")]
    Failed { url: String, message: String },
}

impl VisitError {
    pub fn url(&self) -> &str {
        match self {
            Self::TimedOut { url, .. } | Self::Failed { url, .. } => url,
        }
    }

    /// Short failure reason as reported to reporters
    pub fn reason(&self) -> String {
        match self {
            Self::TimedOut { attempts, .. } => format!("Timeout after {} attempts", attempts),
            Self::Failed { message, .. } => message.clone(),
        }
    }
}

/// Visits pages with bounded retries
#[derive(Debug, Clone)]
pub struct PageVisitor {
    max_attempts: u32,
    retry_delay: Duration,
    page_load_timeout: Duration,
}

impl PageVisitor {
    pub fn new(config: &CrawlerConfig) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            retry_delay: config.retry_delay(),
            page_load_timeout: config.page_load_timeout(),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Loads `url` into the driver
    ///
    /// # Arguments
    ///
    /// * `driver` - The page driver to load into
    /// * `url` - The URL to visit
    /// * `reporter` - Notified once if the visit fails
    ///
    /// # Returns
    ///
    /// * `Ok(VisitReport)` - The driver is positioned on `url`
    /// * `Err(VisitError)` - Retries were exhausted or a non-transient error occurred
    pub async fn visit<D: PageDriver + ?Sized>(
        &self,
        driver: &mut D,
        url: &str,
        reporter: &dyn CrawlReporter,
    ) -> Result<VisitReport, VisitError> {
        let mut attempts = 0;

        loop {
            attempts += 1;
            let started = Instant::now();

            match self.attempt(driver, url).await {
                Ok(()) => {
                    let load_time = started.elapsed();
                    tracing::debug!(
                        "Loaded {} in {}ms (attempt {}/{})",
                        url,
                        load_time.as_millis(),
                        attempts,
                        self.max_attempts
                    );
                    return Ok(VisitReport {
                        attempts,
                        load_time,
                    });
                }
                Err(e) if e.is_timeout() => {
                    if attempts >= self.max_attempts {
                        let error = VisitError::TimedOut {
                            url: url.to_string(),
                            attempts,
                        };
                        tracing::warn!("{}", error);
                        notify(reporter.on_page_failed(url, &error.reason()));
                        return Err(error);
                    }

                    tracing::debug!(
                        "Attempt {}/{} for {} timed out ({}), retrying in {}ms",
                        attempts,
                        self.max_attempts,
                        url,
                        e,
                        self.retry_delay.as_millis()
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => {
                    let error = VisitError::Failed {
                        url: url.to_string(),
                        message: e.to_string(),
                    };
                    tracing::error!("{}", error);
                    notify(reporter.on_page_failed(url, &error.reason()));
                    return Err(error);
                }
            }
        }
    }

    async fn attempt<D: PageDriver + ?Sized>(
        &self,
        driver: &mut D,
        url: &str,
    ) -> Result<(), DriverError> {
        driver.navigate(url).await?;
        driver.wait_document_ready(self.page_load_timeout).await
    }
}
