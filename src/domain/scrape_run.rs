use std::fmt;

use uuid::Uuid;

/// Identity of one scrape request. Every core log line is prefixed with it so
/// concurrent sessions can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeRun {
    id: Uuid,
}

impl ScrapeRun {
    pub fn new() -> Self {
        ScrapeRun { id: Uuid::new_v4() }
    }
}

impl Default for ScrapeRun {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ScrapeRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let simple = self.id.simple().to_string();
        write!(f, "scrape:{}", &simple[..8])
    }
}
