use tokio::time::sleep;

use crate::{
    configuration::{ScraperSettings, SelectorSettings},
    domain::scrape_run::ScrapeRun,
    error::DriverError,
    services::page_driver::PageDriver,
};

pub const SCROLL_FEED_SCRIPT: &str = "arguments[0].scrollBy(0, arguments[0].scrollHeight);";
pub const FEED_HEIGHT_SCRIPT: &str = "return arguments[0].scrollHeight;";

/// Drives the lazily loaded results feed. The page gives no "load more"
/// signal, so the only way to know it is exhausted is that scrolling stops
/// growing the feed.
pub struct PaginationLoader<'a, D: PageDriver> {
    driver: &'a D,
    settings: &'a ScraperSettings,
    selectors: &'a SelectorSettings,
    run: ScrapeRun,
}

impl<'a, D: PageDriver> PaginationLoader<'a, D> {
    pub fn new(
        driver: &'a D,
        settings: &'a ScraperSettings,
        selectors: &'a SelectorSettings,
        run: ScrapeRun,
    ) -> Self {
        PaginationLoader {
            driver,
            settings,
            selectors,
            run,
        }
    }

    /// Scrolls until `target_count` cards are visible, the feed height stops
    /// growing, or the round budget runs out. Returns the visible card count.
    pub async fn load_until_stable(&self, target_count: usize) -> Result<usize, DriverError> {
        let max_rounds = self.settings.max_scroll_rounds(target_count);

        let Some(feed) = self.find_feed().await? else {
            log::warn!("[{}] Could not find results feed to scroll", self.run);
            return self.visible_cards().await;
        };

        let mut last_height = self.feed_height(&feed).await?;
        let mut stable_rounds = 0;
        let mut rounds = 0;

        while rounds < max_rounds {
            let visible = self.visible_cards().await?;
            if visible >= target_count {
                log::debug!("[{}] {} cards visible, enough for {}", self.run, visible, target_count);
                break;
            }

            if let Err(e) = self.driver.evaluate(SCROLL_FEED_SCRIPT, &feed).await {
                if e.is_fatal() {
                    return Err(e);
                }
                log::warn!("[{}] Could not scroll results feed: {}", self.run, e);
                break;
            }
            rounds += 1;
            sleep(self.settings.scroll_settle()).await;

            let Some(height) = self.feed_height(&feed).await? else {
                log::warn!("[{}] Lost track of feed height", self.run);
                break;
            };

            match last_height {
                Some(previous) if height <= previous => stable_rounds += 1,
                _ => stable_rounds = 0,
            }
            last_height = Some(height);

            if stable_rounds >= self.settings.stable_rounds {
                log::debug!("[{}] Feed stable at height {} after {} rounds", self.run, height, rounds);
                break;
            }
        }

        let visible = self.visible_cards().await?;
        log::info!("[{}] Scrolled {} rounds, {} cards visible", self.run, rounds, visible);
        Ok(visible)
    }

    async fn find_feed(&self) -> Result<Option<D::Element>, DriverError> {
        for selector in self.selectors.feed.iter() {
            match self.driver.locate_all(selector).await {
                Ok(found) => {
                    if let Some(feed) = found.into_iter().next() {
                        return Ok(Some(feed));
                    }
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => log::debug!("[{}] Feed lookup {} failed: {}", self.run, selector, e),
            }
        }
        Ok(None)
    }

    async fn feed_height(&self, feed: &D::Element) -> Result<Option<u64>, DriverError> {
        match self.driver.evaluate(FEED_HEIGHT_SCRIPT, feed).await {
            Ok(value) => Ok(value.as_u64().or_else(|| value.as_f64().map(|h| h as u64))),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                log::debug!("[{}] Could not read feed height: {}", self.run, e);
                Ok(None)
            }
        }
    }

    /// Count under the first card selector that matches anything, the same
    /// one the card locator will settle on.
    async fn visible_cards(&self) -> Result<usize, DriverError> {
        for selector in self.selectors.cards.iter() {
            match self.driver.locate_all(selector).await {
                Ok(found) if !found.is_empty() => return Ok(found.len()),
                Ok(_) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(_) => {}
            }
        }
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::DriverError,
        services::fake_driver::{FakeDriver, FakeElement},
    };

    const FEED: &str = "div[role='feed']";
    const CARD: &str = "div[role='feed'] a.hfpxzc";

    fn quick_settings() -> ScraperSettings {
        ScraperSettings {
            scroll_settle_ms: 0,
            ..ScraperSettings::default()
        }
    }

    fn card(n: usize) -> FakeElement {
        FakeElement::card(&format!("https://maps.test/maps/place/{}", n))
    }

    #[tokio::test]
    async fn stops_after_two_rounds_without_growth() {
        let driver = FakeDriver::new("https://maps.test/search");
        driver.add(FEED, FakeElement::new());
        driver.add(CARD, card(0));
        driver.set_heights(&[1000, 2000, 2000, 2000, 2000]);
        let settings = quick_settings();
        let selectors = SelectorSettings::default();

        let visible = PaginationLoader::new(&driver, &settings, &selectors, ScrapeRun::new())
            .load_until_stable(50)
            .await
            .unwrap();

        // 1000 -> 2000 grows, then two flat rounds.
        assert_eq!(driver.scroll_calls(), 3);
        assert_eq!(visible, 1);
    }

    #[tokio::test]
    async fn round_budget_bounds_an_endless_feed() {
        let driver = FakeDriver::new("https://maps.test/search");
        driver.add(FEED, FakeElement::new());
        let heights: Vec<u64> = (1..=100).map(|n| n * 1000).collect();
        driver.set_heights(&heights);
        let settings = quick_settings();
        let selectors = SelectorSettings::default();

        PaginationLoader::new(&driver, &settings, &selectors, ScrapeRun::new())
            .load_until_stable(10)
            .await
            .unwrap();

        assert_eq!(driver.scroll_calls(), settings.max_scroll_rounds(10));
    }

    #[tokio::test]
    async fn stops_once_enough_cards_are_visible() {
        let driver = FakeDriver::new("https://maps.test/search");
        driver.add(FEED, FakeElement::new());
        driver.add(CARD, card(0));
        driver.add(CARD, card(1));
        driver.reveal_on_scroll(vec![(CARD, card(2)), (CARD, card(3))]);
        driver.set_heights(&[1000, 2000, 3000, 4000]);
        let settings = quick_settings();
        let selectors = SelectorSettings::default();

        let visible = PaginationLoader::new(&driver, &settings, &selectors, ScrapeRun::new())
            .load_until_stable(3)
            .await
            .unwrap();

        assert_eq!(driver.scroll_calls(), 1);
        assert_eq!(visible, 4);
    }

    #[tokio::test]
    async fn missing_feed_skips_scrolling() {
        let driver = FakeDriver::new("https://maps.test/search");
        let settings = quick_settings();
        let selectors = SelectorSettings::default();

        let visible = PaginationLoader::new(&driver, &settings, &selectors, ScrapeRun::new())
            .load_until_stable(10)
            .await
            .unwrap();

        assert_eq!(visible, 0);
        assert_eq!(driver.scroll_calls(), 0);
    }

    #[tokio::test]
    async fn lost_session_propagates() {
        let driver = FakeDriver::new("https://maps.test/search");
        driver.add(FEED, FakeElement::new());
        driver.crash();
        let settings = quick_settings();
        let selectors = SelectorSettings::default();

        let result = PaginationLoader::new(&driver, &settings, &selectors, ScrapeRun::new())
            .load_until_stable(10)
            .await;

        assert!(matches!(result, Err(DriverError::Fatal(_))));
    }
}
