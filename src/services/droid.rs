use std::time::Duration;

use thirtyfour::{error::WebDriverError, prelude::*, ChromeCapabilities, ChromiumLikeCapabilities};

use crate::{
    configuration::WebDriverSettings,
    error::DriverError,
    services::page_driver::{PageDriver, SessionLauncher, SessionOptions},
};

/// Messages the WebDriver server sends once the browser behind a session is
/// gone. Anything else is a command that failed on a live page.
const SESSION_LOST_MARKERS: [&str; 6] = [
    "invalid session id",
    "no such window",
    "chrome not reachable",
    "disconnected",
    "connection refused",
    "connection failed",
];

fn classify(e: WebDriverError) -> DriverError {
    classify_message(e.to_string())
}

fn classify_message(message: String) -> DriverError {
    let lowered = message.to_lowercase();
    match SESSION_LOST_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        true => DriverError::Fatal(message),
        false => DriverError::Command(message),
    }
}

/// One Chrome session on a remote WebDriver server.
pub struct Droid {
    pub driver: WebDriver,
}

impl PageDriver for Droid {
    type Element = WebElement;

    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), DriverError> {
        match tokio::time::timeout(timeout, self.driver.goto(url)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => match classify(e) {
                DriverError::Command(message) => Err(DriverError::Navigation(message)),
                fatal => Err(fatal),
            },
            Err(_) => Err(DriverError::NavigationTimeout(timeout)),
        }
    }

    async fn locate_all(&self, selector: &str) -> Result<Vec<WebElement>, DriverError> {
        self.driver.find_all(By::Css(selector)).await.map_err(classify)
    }

    async fn locate_within(
        &self,
        parent: &WebElement,
        selector: &str,
    ) -> Result<Vec<WebElement>, DriverError> {
        parent.find_all(By::Css(selector)).await.map_err(classify)
    }

    async fn text(&self, element: &WebElement) -> Option<String> {
        element.text().await.ok()
    }

    async fn attribute(&self, element: &WebElement, name: &str) -> Option<String> {
        element.attr(name).await.ok().flatten()
    }

    async fn evaluate(
        &self,
        script: &str,
        target: &WebElement,
    ) -> Result<serde_json::Value, DriverError> {
        let argument = target.to_json().map_err(classify)?;
        let ret = self
            .driver
            .execute(script, vec![argument])
            .await
            .map_err(classify)?;
        Ok(ret.json().clone())
    }

    async fn click(&self, element: &WebElement) -> Result<(), DriverError> {
        element.click().await.map_err(classify)
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        let url = self.driver.current_url().await.map_err(classify)?;
        Ok(url.to_string())
    }

    async fn close(self) -> Result<(), DriverError> {
        self.driver.quit().await.map_err(classify)
    }
}

/// Starts a fresh Chrome session per request against `webdriver.url`.
pub struct ChromeLauncher {
    settings: WebDriverSettings,
}

impl ChromeLauncher {
    pub fn new(settings: WebDriverSettings) -> Self {
        ChromeLauncher { settings }
    }

    fn capabilities(&self, options: &SessionOptions) -> Result<ChromeCapabilities, WebDriverError> {
        let mut caps = DesiredCapabilities::chrome();

        for arg in self.settings.chrome_args.iter() {
            caps.add_arg(arg)?;
        }
        if options.headless {
            caps.add_arg("--headless=new")?;
        }
        caps.add_arg(&format!("--lang={}", options.locale))?;
        if let Some(user_agent) = &self.settings.user_agent {
            caps.add_arg(&format!("--user-agent={}", user_agent))?;
        }

        Ok(caps)
    }
}

impl SessionLauncher for ChromeLauncher {
    type Driver = Droid;

    async fn launch(&self, options: &SessionOptions) -> Result<Droid, DriverError> {
        let caps = self.capabilities(options).map_err(classify)?;

        log::debug!(
            "Starting chrome session on {} (headless: {}, lang: {})",
            self.settings.url,
            options.headless,
            options.locale
        );
        // A session that never started has nothing to keep; every launch
        // error is final.
        let driver = WebDriver::new(&self.settings.url, caps)
            .await
            .map_err(|e| DriverError::Fatal(e.to_string()))?;

        Ok(Droid { driver })
    }
}
