use itertools::Itertools;

use crate::{
    configuration::SelectorSettings, domain::scrape_run::ScrapeRun, error::DriverError,
    services::page_driver::PageDriver,
};

/// A result card found in the feed and not yet opened.
#[derive(Debug, Clone)]
pub struct ListingCandidate<E> {
    pub index: usize,
    pub element: E,
    pub raw_href: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LocatedCards<E> {
    pub candidates: Vec<ListingCandidate<E>>,
    /// Distinct cards on the page before truncation.
    pub discovered: usize,
    /// Position in the card ladder of the selector that matched.
    pub strategy_used: Option<usize>,
}

impl<E> LocatedCards<E> {
    fn none() -> Self {
        LocatedCards {
            candidates: vec![],
            discovered: 0,
            strategy_used: None,
        }
    }
}

#[derive(PartialEq, Eq, Hash)]
enum CardKey {
    Href(String),
    Position(usize),
}

pub struct CardLocator<'a, D: PageDriver> {
    driver: &'a D,
    selectors: &'a SelectorSettings,
    run: ScrapeRun,
}

impl<'a, D: PageDriver> CardLocator<'a, D> {
    pub fn new(driver: &'a D, selectors: &'a SelectorSettings, run: ScrapeRun) -> Self {
        CardLocator {
            driver,
            selectors,
            run,
        }
    }

    /// Picks the first card selector that matches anything and uses only that
    /// one. Mixing selectors would interleave duplicates out of feed order.
    pub async fn locate(&self, max_results: usize) -> Result<LocatedCards<D::Element>, DriverError> {
        for (rung, selector) in self.selectors.cards.iter().enumerate() {
            let elements = match self.driver.locate_all(selector).await {
                Ok(elements) => elements,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    log::debug!("[{}] Card selector {} failed: {}", self.run, selector, e);
                    continue;
                }
            };
            if elements.is_empty() {
                continue;
            }

            let mut cards = Vec::with_capacity(elements.len());
            for element in elements {
                let href = self.driver.attribute(&element, "href").await;
                cards.push((element, href));
            }

            let unique: Vec<(D::Element, Option<String>)> = cards
                .into_iter()
                .enumerate()
                .unique_by(|(position, (_, href))| match href {
                    Some(href) => CardKey::Href(href.clone()),
                    None => CardKey::Position(*position),
                })
                .map(|(_, card)| card)
                .collect();
            let discovered = unique.len();

            let candidates = unique
                .into_iter()
                .take(max_results)
                .enumerate()
                .map(|(index, (element, raw_href))| ListingCandidate {
                    index,
                    element,
                    raw_href,
                })
                .collect::<Vec<_>>();

            log::info!(
                "[{}] Found {} places via {} (keeping {})",
                self.run,
                discovered,
                selector,
                candidates.len()
            );

            return Ok(LocatedCards {
                candidates,
                discovered,
                strategy_used: Some(rung),
            });
        }

        log::warn!("[{}] No card selector matched", self.run);
        Ok(LocatedCards::none())
    }
}
