use crate::error::RequestError;

/// A validated scrape request. Built once per call and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    query: String,
    max_results: usize,
    locale: String,
    headless: bool,
}

impl SearchRequest {
    /// `max_results` above `max_results_limit` is clamped, not rejected.
    pub fn parse(
        query: &str,
        max_results: usize,
        locale: &str,
        headless: bool,
        max_results_limit: usize,
    ) -> Result<Self, RequestError> {
        let query = query.split_whitespace().collect::<Vec<&str>>().join(" ");
        if query.is_empty() {
            return Err(RequestError::EmptyQuery);
        }

        let locale = locale.trim();
        if !is_language_tag(locale) {
            return Err(RequestError::InvalidLocale(locale.to_string()));
        }

        if max_results > max_results_limit {
            log::warn!(
                "max_results {} above limit, clamping to {}",
                max_results,
                max_results_limit
            );
        }

        Ok(SearchRequest {
            query,
            max_results: max_results.min(max_results_limit),
            locale: locale.to_string(),
            headless,
        })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn headless(&self) -> bool {
        self.headless
    }
}

/// `en`, `ka`, `pt-BR`, `zh_Hant_TW`; not a full BCP 47 validator.
fn is_language_tag(tag: &str) -> bool {
    let mut subtags = tag.split(['-', '_']);
    let primary_ok = subtags
        .next()
        .is_some_and(|p| (2..=3).contains(&p.len()) && p.chars().all(|c| c.is_ascii_alphabetic()));

    primary_ok
        && subtags.all(|s| (1..=8).contains(&s.len()) && s.chars().all(|c| c.is_ascii_alphanumeric()))
}
