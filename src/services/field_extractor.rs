use crate::{
    domain::{
        field_value::FieldValue,
        scrape_run::ScrapeRun,
        strategy::{ExtractionStrategy, FieldKind, StrategyScope, ValueSource},
    },
    error::DriverError,
    services::page_driver::PageDriver,
};

/// Runs strategy ladders against the current view (or the card a listing
/// came from). The first rung that yields a parseable value wins; when none
/// does the field is absent. Only a lost session is an error.
pub struct FieldExtractor<'a, D: PageDriver> {
    driver: &'a D,
    run: ScrapeRun,
}

impl<'a, D: PageDriver> FieldExtractor<'a, D> {
    pub fn new(driver: &'a D, run: ScrapeRun) -> Self {
        FieldExtractor { driver, run }
    }

    /// Single-valued field: each rung reads its first matched element only.
    pub async fn extract<T>(
        &self,
        card: &D::Element,
        kind: FieldKind,
        ladder: &[ExtractionStrategy],
        parse: impl Fn(&str) -> Option<T>,
    ) -> Result<FieldValue<T>, DriverError> {
        for (rung, strategy) in ladder.iter().enumerate() {
            let raw = self.read(card, strategy, 1).await?;

            if let Some(value) = raw.iter().find_map(|raw| parse(&prepare(strategy, raw))) {
                log::debug!(
                    "[{}] {} via rung {} ({})",
                    self.run,
                    kind.as_str(),
                    rung,
                    strategy.describe()
                );
                return Ok(FieldValue::found(value, rung));
            }
        }

        log::debug!("[{}] {} absent after {} strategies", self.run, kind.as_str(), ladder.len());
        Ok(FieldValue::absent())
    }

    /// Multi-valued field: every matched element of a rung is read, keeping up
    /// to `cap` distinct parsed values in page order.
    pub async fn extract_all<T: PartialEq>(
        &self,
        card: &D::Element,
        kind: FieldKind,
        ladder: &[ExtractionStrategy],
        cap: usize,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Result<FieldValue<Vec<T>>, DriverError> {
        if cap == 0 {
            return Ok(FieldValue::absent());
        }

        for (rung, strategy) in ladder.iter().enumerate() {
            let raw = self.read(card, strategy, usize::MAX).await?;

            let mut values: Vec<T> = Vec::new();
            for value in raw.iter().filter_map(|raw| parse(&prepare(strategy, raw))) {
                if !values.contains(&value) {
                    values.push(value);
                }
                if values.len() == cap {
                    break;
                }
            }

            if !values.is_empty() {
                log::debug!(
                    "[{}] {} x{} via rung {} ({})",
                    self.run,
                    kind.as_str(),
                    values.len(),
                    rung,
                    strategy.describe()
                );
                return Ok(FieldValue::found(values, rung));
            }
        }

        Ok(FieldValue::absent())
    }

    /// Raw values of up to `limit` elements matched by one strategy.
    async fn read(
        &self,
        card: &D::Element,
        strategy: &ExtractionStrategy,
        limit: usize,
    ) -> Result<Vec<String>, DriverError> {
        let lookup = match (&strategy.scope, &strategy.selector) {
            (StrategyScope::Page, Some(selector)) => self.driver.locate_all(selector).await,
            (StrategyScope::Card, Some(selector)) => self.driver.locate_within(card, selector).await,
            (StrategyScope::Card, None) => Ok(vec![card.clone()]),
            (StrategyScope::Page, None) => {
                log::warn!("[{}] Page strategy without selector ignored", self.run);
                Ok(vec![])
            }
        };
        let elements = match lookup {
            Ok(elements) => elements,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                log::debug!("[{}] {} failed: {}", self.run, strategy.describe(), e);
                return Ok(vec![]);
            }
        };

        let mut raw = Vec::new();
        for element in elements.iter().take(limit) {
            let value = match &strategy.source {
                ValueSource::Text => self.driver.text(element).await,
                ValueSource::Attribute(name) => self.driver.attribute(element, name).await,
            };
            raw.extend(value);
        }
        Ok(raw)
    }
}

fn prepare(strategy: &ExtractionStrategy, raw: &str) -> String {
    match &strategy.transform {
        Some(transform) => transform.apply(raw),
        None => raw.to_string(),
    }
}
