use crate::{
    configuration::{ScraperSettings, SelectorSettings},
    domain::{maps_url::search_url, scrape_run::ScrapeRun},
    error::DriverError,
    services::page_driver::{wait_for_any, wait_for_url_change, PageDriver},
};

pub struct NavigationController<'a, D: PageDriver> {
    driver: &'a D,
    settings: &'a ScraperSettings,
    selectors: &'a SelectorSettings,
    run: ScrapeRun,
}

impl<'a, D: PageDriver> NavigationController<'a, D> {
    pub fn new(
        driver: &'a D,
        settings: &'a ScraperSettings,
        selectors: &'a SelectorSettings,
        run: ScrapeRun,
    ) -> Self {
        NavigationController {
            driver,
            settings,
            selectors,
            run,
        }
    }

    /// Opens the search page for `query` and waits for the results shell.
    /// Only the navigation itself can fail; a shell that never renders is
    /// left for the card locator to report as zero results.
    pub async fn open(&self, query: &str, locale: &str) -> Result<(), DriverError> {
        let url = search_url(&self.settings.search_base_url, query, locale);
        log::info!("[{}] Opening: {}", self.run, url);

        self.driver
            .navigate(&url, self.settings.navigation_timeout())
            .await?;

        self.accept_consent().await?;

        let shell = wait_for_any(
            self.driver,
            &self.selectors.results_shell,
            self.settings.settle_timeout(),
            self.settings.poll_interval(),
        )
        .await?;

        match shell {
            Some(position) => log::debug!(
                "[{}] Results shell rendered ({})",
                self.run,
                self.selectors.results_shell[position]
            ),
            None => log::warn!(
                "[{}] Results shell did not render within {:?}",
                self.run,
                self.settings.settle_timeout()
            ),
        }

        Ok(())
    }

    /// Some regions land on `consent.google.com` before the search page.
    async fn accept_consent(&self) -> Result<(), DriverError> {
        let url = self.driver.current_url().await?;
        let on_consent_page = url::Url::parse(&url)
            .ok()
            .and_then(|u| u.host_str().map(|host| host.starts_with("consent.")))
            .unwrap_or(false);
        if !on_consent_page {
            return Ok(());
        }

        for selector in self.selectors.consent_buttons.iter() {
            let buttons = match self.driver.locate_all(selector).await {
                Ok(buttons) => buttons,
                Err(e) if e.is_fatal() => return Err(e),
                Err(_) => continue,
            };
            let Some(button) = buttons.first() else {
                continue;
            };

            match self.driver.click(button).await {
                Ok(()) => {
                    log::info!("[{}] Accepted consent interstitial", self.run);
                    wait_for_url_change(
                        self.driver,
                        &url,
                        self.settings.navigation_timeout(),
                        self.settings.poll_interval(),
                    )
                    .await?;
                    return Ok(());
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => log::debug!("[{}] Consent button {} failed: {}", self.run, selector, e),
            }
        }

        log::warn!("[{}] Stuck on consent page, no button matched", self.run);
        Ok(())
    }
}
