//! In-memory [`PageDriver`] for exercising the extraction engine without a
//! browser. Elements are registered under the literal selector string the
//! engine will ask for.

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard,
    },
    time::Duration,
};

use crate::{
    error::DriverError,
    services::{
        pagination::{FEED_HEIGHT_SCRIPT, SCROLL_FEED_SCRIPT},
        page_driver::{PageDriver, SessionLauncher, SessionOptions},
    },
};

#[derive(Debug, Clone, PartialEq)]
pub enum ClickEffect {
    Nothing,
    /// Switches the page to the detail view registered under this URL.
    OpenDetail(String),
    /// Shows the view registered under this key without changing the URL.
    ShowPanel(String),
    Fail,
    Crash,
}

#[derive(Debug, Clone)]
pub struct FakeElement {
    text: Option<String>,
    attrs: HashMap<String, String>,
    children: Vec<(String, FakeElement)>,
    on_click: ClickEffect,
}

impl FakeElement {
    pub fn new() -> Self {
        FakeElement {
            text: None,
            attrs: HashMap::new(),
            children: vec![],
            on_click: ClickEffect::Nothing,
        }
    }

    pub fn text(text: &str) -> Self {
        FakeElement {
            text: Some(text.to_string()),
            ..FakeElement::new()
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn child(mut self, selector: &str, element: FakeElement) -> Self {
        self.children.push((selector.to_string(), element));
        self
    }

    pub fn on_click(mut self, effect: ClickEffect) -> Self {
        self.on_click = effect;
        self
    }

    /// A results-feed card linking to `href`, opening that detail view on click.
    pub fn card(href: &str) -> Self {
        FakeElement::new()
            .attr("href", href)
            .on_click(ClickEffect::OpenDetail(href.to_string()))
    }
}

#[derive(Default)]
struct FakeState {
    url: String,
    page: Vec<(String, FakeElement)>,
    views: HashMap<String, Vec<(String, FakeElement)>>,
    current_view: Option<String>,
    heights: VecDeque<u64>,
    height: u64,
    reveal_on_scroll: VecDeque<Vec<(String, FakeElement)>>,
    navigation_error: Option<DriverError>,
    navigation_delay: Duration,
    navigations: Vec<String>,
    clicks: usize,
}

#[derive(Clone)]
pub struct FakeDriver {
    state: Arc<Mutex<FakeState>>,
    crashed: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
    scrolls: Arc<AtomicUsize>,
}

impl FakeDriver {
    pub fn new(url: &str) -> Self {
        FakeDriver {
            state: Arc::new(Mutex::new(FakeState {
                url: url.to_string(),
                ..FakeState::default()
            })),
            crashed: Arc::new(AtomicBool::new(false)),
            closed: Arc::new(AtomicBool::new(false)),
            scrolls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake driver state poisoned")
    }

    pub fn add(&self, selector: &str, element: FakeElement) {
        self.state().page.push((selector.to_string(), element));
    }

    pub fn add_detail(&self, url: &str, selector: &str, element: FakeElement) {
        self.state()
            .views
            .entry(url.to_string())
            .or_default()
            .push((selector.to_string(), element));
    }

    /// Registers a detail view with no content at all.
    pub fn add_empty_detail(&self, url: &str) {
        self.state().views.entry(url.to_string()).or_default();
    }

    pub fn set_heights(&self, heights: &[u64]) {
        let mut state = self.state();
        state.heights = heights.iter().copied().collect();
        state.height = state.heights.front().copied().unwrap_or_default();
    }

    pub fn reveal_on_scroll(&self, batch: Vec<(&str, FakeElement)>) {
        let batch = batch
            .into_iter()
            .map(|(selector, element)| (selector.to_string(), element))
            .collect();
        self.state().reveal_on_scroll.push_back(batch);
    }

    pub fn fail_navigation(&self, error: DriverError) {
        self.state().navigation_error = Some(error);
    }

    pub fn delay_navigation(&self, delay: Duration) {
        self.state().navigation_delay = delay;
    }

    pub fn crash(&self) {
        self.crashed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn scroll_calls(&self) -> usize {
        self.scrolls.load(Ordering::SeqCst)
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state().navigations.clone()
    }

    pub fn clicks(&self) -> usize {
        self.state().clicks
    }

    fn alive(&self) -> Result<(), DriverError> {
        match self.crashed.load(Ordering::SeqCst) {
            true => Err(DriverError::Fatal("chrome not reachable".to_string())),
            false => Ok(()),
        }
    }
}

impl PageDriver for FakeDriver {
    type Element = FakeElement;

    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), DriverError> {
        self.alive()?;
        let (error, delay) = {
            let mut state = self.state();
            state.navigations.push(url.to_string());
            (state.navigation_error.clone(), state.navigation_delay)
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = error {
            return Err(match error {
                DriverError::NavigationTimeout(_) => DriverError::NavigationTimeout(timeout),
                other => other,
            });
        }

        let mut state = self.state();
        state.url = url.to_string();
        state.current_view = state.views.contains_key(url).then(|| url.to_string());
        Ok(())
    }

    async fn locate_all(&self, selector: &str) -> Result<Vec<FakeElement>, DriverError> {
        self.alive()?;
        let state = self.state();

        let detail = state
            .current_view
            .as_ref()
            .and_then(|view| state.views.get(view))
            .into_iter()
            .flatten();
        let found = detail
            .chain(state.page.iter())
            .filter(|(registered, _)| registered == selector)
            .map(|(_, element)| element.clone())
            .collect();
        Ok(found)
    }

    async fn locate_within(
        &self,
        parent: &FakeElement,
        selector: &str,
    ) -> Result<Vec<FakeElement>, DriverError> {
        self.alive()?;
        Ok(parent
            .children
            .iter()
            .filter(|(registered, _)| registered == selector)
            .map(|(_, element)| element.clone())
            .collect())
    }

    async fn text(&self, element: &FakeElement) -> Option<String> {
        self.alive().ok()?;
        element.text.clone()
    }

    async fn attribute(&self, element: &FakeElement, name: &str) -> Option<String> {
        self.alive().ok()?;
        element.attrs.get(name).cloned()
    }

    async fn evaluate(
        &self,
        script: &str,
        _target: &FakeElement,
    ) -> Result<serde_json::Value, DriverError> {
        self.alive()?;
        let mut state = self.state();

        if script == SCROLL_FEED_SCRIPT {
            self.scrolls.fetch_add(1, Ordering::SeqCst);
            state.heights.pop_front();
            if let Some(next) = state.heights.front().copied() {
                state.height = next;
            }
            if let Some(batch) = state.reveal_on_scroll.pop_front() {
                state.page.extend(batch);
            }
            Ok(serde_json::Value::Null)
        } else if script == FEED_HEIGHT_SCRIPT {
            Ok(serde_json::json!(state.height))
        } else {
            Err(DriverError::Command(format!("unexpected script: {}", script)))
        }
    }

    async fn click(&self, element: &FakeElement) -> Result<(), DriverError> {
        self.alive()?;
        self.state().clicks += 1;

        match &element.on_click {
            ClickEffect::Nothing => Ok(()),
            ClickEffect::OpenDetail(url) => {
                let mut state = self.state();
                state.url = url.clone();
                state.current_view = Some(url.clone());
                Ok(())
            }
            ClickEffect::ShowPanel(view) => {
                self.state().current_view = Some(view.clone());
                Ok(())
            }
            ClickEffect::Fail => Err(DriverError::Command(
                "element click intercepted".to_string(),
            )),
            ClickEffect::Crash => {
                self.crash();
                Err(DriverError::Fatal("disconnected".to_string()))
            }
        }
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        self.alive()?;
        Ok(self.state().url.clone())
    }

    async fn close(self) -> Result<(), DriverError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out clones of one prepared [`FakeDriver`].
pub struct FakeLauncher {
    driver: FakeDriver,
    launch_error: Option<DriverError>,
    launched: Mutex<Vec<SessionOptions>>,
}

impl FakeLauncher {
    pub fn new(driver: FakeDriver) -> Self {
        FakeLauncher {
            driver,
            launch_error: None,
            launched: Mutex::new(vec![]),
        }
    }

    pub fn failing(error: DriverError) -> Self {
        FakeLauncher {
            launch_error: Some(error),
            ..FakeLauncher::new(FakeDriver::new("about:blank"))
        }
    }

    pub fn launched(&self) -> Vec<SessionOptions> {
        self.launched.lock().expect("launcher state poisoned").clone()
    }
}

impl SessionLauncher for FakeLauncher {
    type Driver = FakeDriver;

    async fn launch(&self, options: &SessionOptions) -> Result<FakeDriver, DriverError> {
        self.launched
            .lock()
            .expect("launcher state poisoned")
            .push(options.clone());

        match &self.launch_error {
            Some(error) => Err(error.clone()),
            None => Ok(self.driver.clone()),
        }
    }
}
