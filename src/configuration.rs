use std::time::Duration;

use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::domain::strategy::{ExtractionStrategy, FieldKind, StrategyScope, ValueSource};

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub webdriver: WebDriverSettings,
    #[serde(default)]
    pub scraper: ScraperSettings,
    #[serde(default)]
    pub selectors: SelectorSettings,
}

#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
}

#[derive(Deserialize, Clone)]
pub struct WebDriverSettings {
    pub url: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_sessions: usize,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default = "default_chrome_args")]
    pub chrome_args: Vec<String>,
}

fn default_chrome_args() -> Vec<String> {
    [
        "--no-sandbox",
        "--disable-dev-shm-usage",
        "--disable-blink-features=AutomationControlled",
        "--window-size=1920,1080",
    ]
    .iter()
    .map(|arg| arg.to_string())
    .collect()
}

/// Timing and sizing knobs of the extraction engine.
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ScraperSettings {
    pub search_base_url: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub navigation_timeout_secs: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub settle_timeout_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub scroll_settle_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub detail_settle_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub poll_interval_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub candidate_timeout_secs: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub deadline_secs: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub items_per_scroll_round: usize,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub extra_scroll_rounds: usize,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub stable_rounds: usize,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_photos: usize,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_results_limit: usize,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        ScraperSettings {
            search_base_url: "https://www.google.com/maps/search/".to_string(),
            navigation_timeout_secs: 60,
            settle_timeout_ms: 5_000,
            scroll_settle_ms: 1_500,
            detail_settle_ms: 3_000,
            poll_interval_ms: 250,
            candidate_timeout_secs: 30,
            deadline_secs: 180,
            items_per_scroll_round: 5,
            extra_scroll_rounds: 2,
            stable_rounds: 2,
            max_photos: 5,
            max_results_limit: 100,
        }
    }
}

impl ScraperSettings {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.settle_timeout_ms)
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }

    pub fn detail_settle(&self) -> Duration {
        Duration::from_millis(self.detail_settle_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn candidate_timeout(&self) -> Duration {
        Duration::from_secs(self.candidate_timeout_secs)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }

    /// Upper bound on scroll rounds for a given number of wanted results.
    pub fn max_scroll_rounds(&self, target_count: usize) -> usize {
        target_count / self.items_per_scroll_round.max(1) + self.extra_scroll_rounds
    }
}

/// Selector literals. The target markup is unversioned, so every list is
/// ordered most specific first and can be replaced from configuration.
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct SelectorSettings {
    pub results_shell: Vec<String>,
    pub consent_buttons: Vec<String>,
    pub feed: Vec<String>,
    pub cards: Vec<String>,
    pub detail_ready: Vec<String>,
    pub fields: FieldLadders,
}

impl Default for SelectorSettings {
    fn default() -> Self {
        SelectorSettings {
            results_shell: css_list(&["div[role='feed']", "h1.DUwDvf", "h1"]),
            consent_buttons: css_list(&[
                "form[action*='consent'] button[aria-label^='Accept']",
                "button[aria-label='Accept all']",
                "form[action*='consent'] button",
            ]),
            feed: css_list(&["div[role='feed']", "div.m6QErb[aria-label]"]),
            cards: css_list(&[
                "div[role='feed'] a.hfpxzc",
                "a[href*='/maps/place/']",
                "div[role='article']",
            ]),
            detail_ready: css_list(&["h1.DUwDvf", "div[role='main'] h1", "h1"]),
            fields: FieldLadders::default(),
        }
    }
}

fn css_list(selectors: &[&str]) -> Vec<String> {
    selectors.iter().map(|s| s.to_string()).collect()
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct FieldLadders {
    pub name: Vec<ExtractionStrategy>,
    pub rating: Vec<ExtractionStrategy>,
    pub reviews_count: Vec<ExtractionStrategy>,
    pub address: Vec<ExtractionStrategy>,
    pub website: Vec<ExtractionStrategy>,
    pub phone: Vec<ExtractionStrategy>,
    pub categories: Vec<ExtractionStrategy>,
    pub photos: Vec<ExtractionStrategy>,
}

impl FieldLadders {
    pub fn ladder(&self, kind: FieldKind) -> &[ExtractionStrategy] {
        match kind {
            FieldKind::Name => &self.name,
            FieldKind::Rating => &self.rating,
            FieldKind::ReviewsCount => &self.reviews_count,
            FieldKind::Address => &self.address,
            FieldKind::Website => &self.website,
            FieldKind::Phone => &self.phone,
            FieldKind::Categories => &self.categories,
            FieldKind::Photos => &self.photos,
        }
    }
}

impl Default for FieldLadders {
    fn default() -> Self {
        use ExtractionStrategy as S;

        FieldLadders {
            name: vec![
                S::page("h1.DUwDvf", ValueSource::Text),
                S::page("h1", ValueSource::Text),
                S {
                    scope: StrategyScope::Card,
                    selector: None,
                    source: ValueSource::attribute("aria-label"),
                    transform: None,
                },
            ],
            rating: vec![
                S::page("div.F7nice span[aria-hidden='true']", ValueSource::Text),
                S::page(
                    "span[role='img'][aria-label*='star']",
                    ValueSource::attribute("aria-label"),
                ),
                S::page("span[aria-hidden='true']", ValueSource::Text),
            ],
            reviews_count: vec![
                S::page(
                    "div.F7nice span[aria-label*='review']",
                    ValueSource::attribute("aria-label"),
                ),
                S::page("button[jsaction*='reviewChart'] span", ValueSource::Text),
                S::page("div.F7nice", ValueSource::Text).with_transform_last_line(),
            ],
            address: vec![
                S::page("button[data-item-id='address']", ValueSource::Text),
                S::page(
                    "button[data-item-id='address']",
                    ValueSource::attribute("aria-label"),
                )
                .with_transform_strip_label(),
                S::page("[data-tooltip='Copy address']", ValueSource::Text),
            ],
            website: vec![
                S::page("a[data-item-id='authority']", ValueSource::attribute("href")),
                S::page("a[aria-label^='Website']", ValueSource::attribute("href")),
                S::page("a[data-tooltip='Open website']", ValueSource::attribute("href")),
            ],
            phone: vec![
                S::page(
                    "button[data-item-id^='phone:tel:']",
                    ValueSource::attribute("data-item-id"),
                ),
                S::page("button[data-item-id^='phone']", ValueSource::Text),
                S::page("button[aria-label^='Phone']", ValueSource::attribute("aria-label"))
                    .with_transform_strip_label(),
            ],
            categories: vec![
                S::page("button.DkEaL", ValueSource::Text),
                S::page("button[jsaction*='category']", ValueSource::Text),
            ],
            photos: vec![
                S::page(
                    "button[jsaction*='heroHeaderImage'] img",
                    ValueSource::attribute("src"),
                ),
                S::page("div.RZ66Rb img", ValueSource::attribute("src")),
                S::page(
                    "img[src*='googleusercontent.com']",
                    ValueSource::attribute("src"),
                ),
            ],
        }
    }
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("Failed to determine the current directory: {}", e)))?;
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")))
        .add_source(
            config::File::from(configuration_directory.join(environment_filename)).required(false),
        )
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
