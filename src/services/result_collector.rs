use tokio::time::timeout;

use crate::{
    configuration::ScraperSettings,
    domain::{
        listing::{ListingRecord, ScrapeResult},
        scrape_run::ScrapeRun,
    },
    error::{DriverError, ScrapeFailure},
    services::{card_locator::ListingCandidate, page_driver::PageDriver, record_assembler::RecordAssembler},
};

/// What happened to one candidate.
#[derive(Debug)]
pub enum CandidateOutcome {
    Appended(ListingRecord),
    /// Isolated failure; the batch carries on.
    Skipped(DriverError),
    /// The session is gone; nothing after this candidate can be read.
    Aborted(DriverError),
}

/// Accumulates records in feed order and remembers what was skipped.
#[derive(Debug, Default)]
pub struct ResultCollector {
    records: Vec<ListingRecord>,
    skipped: Vec<usize>,
    aborted: Option<DriverError>,
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` once the batch must stop.
    pub fn record(&mut self, index: usize, outcome: CandidateOutcome, run: ScrapeRun) -> bool {
        match outcome {
            CandidateOutcome::Appended(record) => {
                log::info!(
                    "[{}] ✓ {}: {}",
                    run,
                    index + 1,
                    record.name.as_deref().unwrap_or("<unnamed>")
                );
                self.records.push(record);
                true
            }
            CandidateOutcome::Skipped(e) => {
                log::warn!("[{}] Skipped place {}: {}", run, index + 1, e);
                self.skipped.push(index);
                true
            }
            CandidateOutcome::Aborted(e) => {
                log::error!("[{}] Session lost at place {}: {}", run, index + 1, e);
                self.aborted = Some(e);
                false
            }
        }
    }

    pub fn skipped(&self) -> &[usize] {
        &self.skipped
    }

    pub fn finish(self, requested: usize, found: usize) -> ScrapeResult {
        ScrapeResult {
            records: self.records,
            requested,
            found,
            failure: self.aborted.map(ScrapeFailure::DriverLost),
        }
    }
}

/// Visits every candidate once, in order: Pending -> Processing(i) ->
/// Appended | Skipped -> next, until Done or a lost session aborts the batch.
pub async fn collect<D: PageDriver>(
    assembler: &RecordAssembler<'_, D>,
    candidates: &[ListingCandidate<D::Element>],
    settings: &ScraperSettings,
    run: ScrapeRun,
) -> ResultCollector {
    let mut collector = ResultCollector::new();

    for candidate in candidates {
        let outcome = match timeout(settings.candidate_timeout(), assembler.process(candidate)).await {
            Ok(Ok(record)) => CandidateOutcome::Appended(record),
            Ok(Err(e)) if e.is_fatal() => CandidateOutcome::Aborted(e),
            Ok(Err(e)) => CandidateOutcome::Skipped(e),
            Err(_) => CandidateOutcome::Skipped(DriverError::Command(format!(
                "detail view not read within {:?}",
                settings.candidate_timeout()
            ))),
        };

        if !collector.record(candidate.index, outcome, run) {
            break;
        }
    }

    collector
}
