use tokio::time::{sleep, Instant};

use crate::{
    configuration::{ScraperSettings, SelectorSettings},
    domain::{
        field_parsers::{
            clean_text, normalize_photo_url, parse_phone, parse_rating, parse_review_count,
            parse_website,
        },
        field_value::FieldValue,
        listing::ListingRecord,
        maps_url::{self, DerivedLocation},
        scrape_run::ScrapeRun,
        strategy::FieldKind,
    },
    error::DriverError,
    services::{
        card_locator::ListingCandidate,
        field_extractor::FieldExtractor,
        page_driver::{wait_for_url_change, PageDriver},
    },
};

/// Everything read from one detail view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFields {
    pub name: FieldValue<String>,
    pub rating: FieldValue<f64>,
    pub reviews_count: FieldValue<u32>,
    pub address: FieldValue<String>,
    pub website: FieldValue<String>,
    pub phone: FieldValue<String>,
    pub categories: FieldValue<Vec<String>>,
    pub photos: FieldValue<Vec<String>>,
}

/// Combines extracted and URL-derived fields into one record. Missing fields
/// stay `None`; a missing review count becomes 0.
pub fn assemble(
    index: usize,
    maps_url: String,
    fields: ExtractedFields,
    location: DerivedLocation,
) -> ListingRecord {
    ListingRecord {
        index,
        name: fields.name.into_value(),
        rating: fields.rating.into_value(),
        reviews_count: fields.reviews_count.into_value().unwrap_or(0),
        address: fields.address.into_value(),
        website: fields.website.into_value(),
        phone: fields.phone.into_value(),
        maps_url,
        place_id: location.place_id,
        coordinates: location.coordinates,
        categories: fields.categories.into_vec(),
        photos: fields.photos.into_vec(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailMode {
    /// The URL changed: either a new page or the in-place panel pushed state.
    UrlChanged,
    /// Same URL after the click, but a new heading rendered in place.
    InPlace,
    /// Click failed or left the previous view on screen, so the card link
    /// was opened.
    Followed,
}

pub struct RecordAssembler<'a, D: PageDriver> {
    driver: &'a D,
    settings: &'a ScraperSettings,
    selectors: &'a SelectorSettings,
    run: ScrapeRun,
}

impl<'a, D: PageDriver> RecordAssembler<'a, D> {
    pub fn new(
        driver: &'a D,
        settings: &'a ScraperSettings,
        selectors: &'a SelectorSettings,
        run: ScrapeRun,
    ) -> Self {
        RecordAssembler {
            driver,
            settings,
            selectors,
            run,
        }
    }

    /// Open detail view, read every field, derive URL fields, assemble.
    pub async fn process(
        &self,
        candidate: &ListingCandidate<D::Element>,
    ) -> Result<ListingRecord, DriverError> {
        let mode = self.open_detail(candidate).await?;
        log::debug!("[{}] Card {} detail opened ({:?})", self.run, candidate.index, mode);

        let fields = self.extract_fields(&candidate.element).await?;
        let maps_url = self.driver.current_url().await?;

        let mut location = maps_url::derive(&maps_url);
        if location.is_empty() {
            if let Some(href) = &candidate.raw_href {
                location = location.or(maps_url::derive(href));
            }
        }

        Ok(assemble(candidate.index, maps_url, fields, location))
    }

    async fn open_detail(
        &self,
        candidate: &ListingCandidate<D::Element>,
    ) -> Result<DetailMode, DriverError> {
        let before = self.driver.current_url().await?;
        let previous = self.current_heading().await?;

        if let Err(e) = self.driver.click(&candidate.element).await {
            if e.is_fatal() {
                return Err(e);
            }
            let Some(href) = &candidate.raw_href else {
                return Err(e);
            };
            log::debug!("[{}] Click on card {} failed ({}), following link", self.run, candidate.index, e);
            self.follow(href, previous.as_deref()).await?;
            return Ok(DetailMode::Followed);
        }

        let changed = wait_for_url_change(
            self.driver,
            &before,
            self.settings.detail_settle(),
            self.settings.poll_interval(),
        )
        .await?;
        let fresh = self.wait_ready(previous.as_deref()).await?;

        match (changed, fresh, &candidate.raw_href) {
            (Some(_), _, _) => Ok(DetailMode::UrlChanged),
            (None, true, _) => Ok(DetailMode::InPlace),
            (None, false, Some(href)) => {
                log::debug!(
                    "[{}] Card {} left the previous detail view in place, following link",
                    self.run,
                    candidate.index
                );
                self.follow(href, previous.as_deref()).await?;
                Ok(DetailMode::Followed)
            }
            (None, false, None) => Err(DriverError::Command(format!(
                "card {} did not open a new detail view",
                candidate.index
            ))),
        }
    }

    async fn follow(&self, href: &str, previous: Option<&str>) -> Result<(), DriverError> {
        self.driver
            .navigate(href, self.settings.navigation_timeout())
            .await?;
        self.wait_ready(previous).await?;
        Ok(())
    }

    /// Text of the first detail heading on screen. An unreadable heading
    /// counts as empty text.
    async fn current_heading(&self) -> Result<Option<String>, DriverError> {
        for selector in self.selectors.detail_ready.iter() {
            match self.driver.locate_all(selector).await {
                Ok(found) => {
                    if let Some(heading) = found.first() {
                        return Ok(Some(self.driver.text(heading).await.unwrap_or_default()));
                    }
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => log::debug!("[{}] Heading lookup {} failed: {}", self.run, selector, e),
            }
        }
        Ok(None)
    }

    /// Waits for a detail heading that differs from `previous`, the one shown
    /// before the click. A heading left over from the last listing is not
    /// ready.
    async fn wait_ready(&self, previous: Option<&str>) -> Result<bool, DriverError> {
        let started = Instant::now();

        loop {
            let current = self.current_heading().await?;
            if current.is_some() && current.as_deref() != previous {
                return Ok(true);
            }

            if started.elapsed() >= self.settings.detail_settle() {
                log::debug!("[{}] Detail view shows no new heading", self.run);
                return Ok(false);
            }
            sleep(self.settings.poll_interval()).await;
        }
    }

    pub async fn extract_fields(&self, card: &D::Element) -> Result<ExtractedFields, DriverError> {
        let extractor = FieldExtractor::new(self.driver, self.run);
        let ladders = &self.selectors.fields;
        let ladder = move |kind: FieldKind| ladders.ladder(kind);

        Ok(ExtractedFields {
            name: extractor
                .extract(card, FieldKind::Name, ladder(FieldKind::Name), clean_text)
                .await?,
            rating: extractor
                .extract(card, FieldKind::Rating, ladder(FieldKind::Rating), parse_rating)
                .await?,
            reviews_count: extractor
                .extract(
                    card,
                    FieldKind::ReviewsCount,
                    ladder(FieldKind::ReviewsCount),
                    parse_review_count,
                )
                .await?,
            address: extractor
                .extract(card, FieldKind::Address, ladder(FieldKind::Address), clean_text)
                .await?,
            website: extractor
                .extract(card, FieldKind::Website, ladder(FieldKind::Website), parse_website)
                .await?,
            phone: extractor
                .extract(card, FieldKind::Phone, ladder(FieldKind::Phone), parse_phone)
                .await?,
            categories: extractor
                .extract_all(
                    card,
                    FieldKind::Categories,
                    ladder(FieldKind::Categories),
                    usize::MAX,
                    clean_text,
                )
                .await?,
            photos: extractor
                .extract_all(
                    card,
                    FieldKind::Photos,
                    ladder(FieldKind::Photos),
                    self.settings.max_photos,
                    normalize_photo_url,
                )
                .await?,
        })
    }
}
