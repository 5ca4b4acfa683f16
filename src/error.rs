use std::time::Duration;

use thiserror::Error;

/// Failure of a single browser-session operation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DriverError {
    #[error("navigation did not finish within {0:?}")]
    NavigationTimeout(Duration),

    #[error("navigation failed: {0}")]
    Navigation(String),

    /// The session itself is gone (browser crashed, chromedriver went away).
    #[error("browser session lost: {0}")]
    Fatal(String),

    #[error("webdriver command failed: {0}")]
    Command(String),
}

impl DriverError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, DriverError::Fatal(_))
    }
}

/// Why a scrape request did not (fully) succeed.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ScrapeFailure {
    #[error("could not start a browser session: {0}")]
    Launch(#[source] DriverError),

    #[error("search page failed to load: {0}")]
    Navigation(#[source] DriverError),

    #[error("browser session lost mid-scrape: {0}")]
    DriverLost(#[source] DriverError),

    #[error("scrape exceeded its {0:?} deadline")]
    DeadlineExceeded(Duration),

    #[error("scrape task aborted: {0}")]
    Aborted(String),
}

impl ScrapeFailure {
    /// Caller-facing description. Automation-library detail stays in the logs.
    pub fn summary(&self) -> &'static str {
        match self {
            ScrapeFailure::Launch(_) => "browser session could not be started",
            ScrapeFailure::Navigation(DriverError::NavigationTimeout(_)) => {
                "search page did not load in time"
            }
            ScrapeFailure::Navigation(_) => "search page could not be opened",
            ScrapeFailure::DriverLost(_) => "browser session was lost before any listing was read",
            ScrapeFailure::DeadlineExceeded(_) => "scrape did not finish before its deadline",
            ScrapeFailure::Aborted(_) => "scrape was aborted unexpectedly",
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("query must not be empty")]
    EmptyQuery,

    #[error("'{0}' is not a valid language tag")]
    InvalidLocale(String),

    #[error("invalid query parameters: {0}")]
    Malformed(String),
}
