use std::{future::Future, time::Duration};

use tokio::time::{sleep, Instant};

use crate::error::DriverError;

/// What the extraction engine needs from a live browser session. Nothing in
/// the core depends on a particular automation library beyond this.
///
/// `text` and `attribute` never fail: an unreadable value is `None`.
pub trait PageDriver: Send + Sync {
    type Element: Clone + Send + Sync;

    fn navigate(
        &self,
        url: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<(), DriverError>> + Send;

    fn locate_all(
        &self,
        selector: &str,
    ) -> impl Future<Output = Result<Vec<Self::Element>, DriverError>> + Send;

    fn locate_within(
        &self,
        parent: &Self::Element,
        selector: &str,
    ) -> impl Future<Output = Result<Vec<Self::Element>, DriverError>> + Send;

    fn text(&self, element: &Self::Element) -> impl Future<Output = Option<String>> + Send;

    fn attribute(
        &self,
        element: &Self::Element,
        name: &str,
    ) -> impl Future<Output = Option<String>> + Send;

    /// Runs `script` with the element bound to `arguments[0]`.
    fn evaluate(
        &self,
        script: &str,
        target: &Self::Element,
    ) -> impl Future<Output = Result<serde_json::Value, DriverError>> + Send;

    fn click(&self, element: &Self::Element) -> impl Future<Output = Result<(), DriverError>> + Send;

    fn current_url(&self) -> impl Future<Output = Result<String, DriverError>> + Send;

    fn close(self) -> impl Future<Output = Result<(), DriverError>> + Send
    where
        Self: Sized;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub headless: bool,
    pub locale: String,
}

/// Opens one isolated browser session per scrape request.
pub trait SessionLauncher: Send + Sync + 'static {
    type Driver: PageDriver + 'static;

    fn launch(
        &self,
        options: &SessionOptions,
    ) -> impl Future<Output = Result<Self::Driver, DriverError>> + Send;
}

/// Polls `selectors` until one of them matches, returning its position.
/// Non-fatal lookup errors count as "not yet"; `Ok(None)` means the wait
/// timed out.
pub async fn wait_for_any<D: PageDriver>(
    driver: &D,
    selectors: &[String],
    timeout: Duration,
    poll_interval: Duration,
) -> Result<Option<usize>, DriverError> {
    let started = Instant::now();

    loop {
        for (position, selector) in selectors.iter().enumerate() {
            match driver.locate_all(selector).await {
                Ok(found) if !found.is_empty() => return Ok(Some(position)),
                Ok(_) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => log::debug!("Lookup of {} failed while waiting: {}", selector, e),
            }
        }

        if started.elapsed() >= timeout {
            return Ok(None);
        }
        sleep(poll_interval).await;
    }
}

/// Polls the current URL until it differs from `previous`. Returns the new
/// URL, or `None` if it never changed within `timeout`.
pub async fn wait_for_url_change<D: PageDriver>(
    driver: &D,
    previous: &str,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<Option<String>, DriverError> {
    let started = Instant::now();

    loop {
        match driver.current_url().await {
            Ok(url) if url != previous => return Ok(Some(url)),
            Ok(_) => {}
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => log::debug!("Could not read current url: {}", e),
        }

        if started.elapsed() >= timeout {
            return Ok(None);
        }
        sleep(poll_interval).await;
    }
}
