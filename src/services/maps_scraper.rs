use tokio::{sync::Semaphore, time::timeout};

use crate::{
    configuration::{ScraperSettings, SelectorSettings},
    domain::{listing::ScrapeResult, scrape_run::ScrapeRun, search_request::SearchRequest},
    error::ScrapeFailure,
    services::{
        card_locator::CardLocator,
        navigation::NavigationController,
        page_driver::{PageDriver, SessionLauncher, SessionOptions},
        pagination::PaginationLoader,
        record_assembler::RecordAssembler,
        result_collector::collect,
    },
};

/// Entry point of the extraction engine. One browser session per request,
/// at most `max_sessions` of them alive at once.
pub struct MapsScraper<L: SessionLauncher> {
    launcher: L,
    settings: ScraperSettings,
    selectors: SelectorSettings,
    sessions: Semaphore,
}

impl<L: SessionLauncher> MapsScraper<L> {
    pub fn new(
        launcher: L,
        settings: ScraperSettings,
        selectors: SelectorSettings,
        max_sessions: usize,
    ) -> Self {
        MapsScraper {
            launcher,
            settings,
            selectors,
            sessions: Semaphore::new(max_sessions.max(1)),
        }
    }

    pub fn settings(&self) -> &ScraperSettings {
        &self.settings
    }

    /// Never returns an error: failures are carried in
    /// [`ScrapeResult::failure`]. The session is closed on every path.
    pub async fn scrape(&self, request: &SearchRequest) -> ScrapeResult {
        let run = ScrapeRun::new();
        let requested = request.max_results();

        if requested == 0 {
            log::info!("[{}] Nothing requested for '{}'", run, request.query());
            return ScrapeResult::empty(0);
        }

        let _permit = match self.sessions.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                return ScrapeResult::failed(requested, 0, ScrapeFailure::Aborted(e.to_string()))
            }
        };

        let options = SessionOptions {
            headless: request.headless(),
            locale: request.locale().to_string(),
        };
        let driver = match self.launcher.launch(&options).await {
            Ok(driver) => driver,
            Err(e) => {
                log::error!("[{}] Could not start browser session: {}", run, e);
                return ScrapeResult::failed(requested, 0, ScrapeFailure::Launch(e));
            }
        };

        let deadline = self.settings.deadline();
        let outcome = timeout(deadline, self.scrape_session(&driver, request, run)).await;

        if let Err(e) = driver.close().await {
            log::warn!("[{}] Browser session did not close cleanly: {}", run, e);
        }

        match outcome {
            Ok(result) => {
                log::info!(
                    "[{}] Done: {} of {} requested ({} found)",
                    run,
                    result.records.len(),
                    requested,
                    result.found
                );
                result
            }
            Err(_) => {
                log::error!("[{}] Deadline of {:?} exceeded, discarding results", run, deadline);
                ScrapeResult::failed(requested, 0, ScrapeFailure::DeadlineExceeded(deadline))
            }
        }
    }

    async fn scrape_session(
        &self,
        driver: &L::Driver,
        request: &SearchRequest,
        run: ScrapeRun,
    ) -> ScrapeResult {
        let requested = request.max_results();

        let navigation = NavigationController::new(driver, &self.settings, &self.selectors, run);
        if let Err(e) = navigation.open(request.query(), request.locale()).await {
            log::error!("[{}] Navigation failed: {}", run, e);
            return ScrapeResult::failed(requested, 0, ScrapeFailure::Navigation(e));
        }

        let pagination = PaginationLoader::new(driver, &self.settings, &self.selectors, run);
        if let Err(e) = pagination.load_until_stable(requested).await {
            return ScrapeResult::failed(requested, 0, ScrapeFailure::DriverLost(e));
        }

        let located = match CardLocator::new(driver, &self.selectors, run)
            .locate(requested)
            .await
        {
            Ok(located) => located,
            Err(e) => return ScrapeResult::failed(requested, 0, ScrapeFailure::DriverLost(e)),
        };
        if located.candidates.is_empty() {
            log::info!("[{}] No places found for '{}'", run, request.query());
            return ScrapeResult::empty(requested);
        }

        let assembler = RecordAssembler::new(driver, &self.settings, &self.selectors, run);
        collect(&assembler, &located.candidates, &self.settings, run)
            .await
            .finish(requested, located.discovered)
    }
}
