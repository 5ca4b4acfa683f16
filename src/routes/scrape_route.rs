use actix_web::{
    error::{InternalError, QueryPayloadError},
    web, HttpRequest, HttpResponse,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    domain::{listing::ScrapeResult, search_request::SearchRequest},
    error::{RequestError, ScrapeFailure},
    services::{MapsScraper, SessionLauncher},
};

#[derive(Deserialize)]
pub struct ScrapeQuery {
    #[serde(default)]
    query: String,
    #[serde(default = "default_max_places")]
    max_places: usize,
    #[serde(default = "default_lang")]
    lang: String,
    #[serde(default = "default_headless")]
    headless: bool,
}

fn default_max_places() -> usize {
    10
}

fn default_lang() -> String {
    "en".to_string()
}

fn default_headless() -> bool {
    true
}

fn failure_response(error: &str) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "success": false,
        "error": error,
        "results": [],
    }))
}

/// Malformed parameters (e.g. `max_places=abc`) still answer 200 with the
/// failure shape.
pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let error = RequestError::Malformed(err.to_string());
    log::warn!("Rejected scrape request: {}", error);
    let response = failure_response(&error.to_string());
    InternalError::from_response(err, response).into()
}

/// `GET /scrape-get`. Always 200; `success` tells the caller whether the
/// scrape worked.
pub async fn scrape_get<L: SessionLauncher>(
    params: web::Query<ScrapeQuery>,
    scraper: web::Data<MapsScraper<L>>,
) -> HttpResponse {
    let params = params.into_inner();
    let request = match SearchRequest::parse(
        &params.query,
        params.max_places,
        &params.lang,
        params.headless,
        scraper.settings().max_results_limit,
    ) {
        Ok(request) => request,
        Err(e) => {
            log::warn!("Rejected scrape request: {}", e);
            return failure_response(&e.to_string());
        }
    };

    // The scrape runs on its own task so a dropped connection cannot cancel
    // it halfway and leave the browser session open.
    let scraper = scraper.into_inner();
    let requested = request.max_results();
    let task = tokio::spawn(async move { scraper.scrape(&request).await });
    let result = match task.await {
        Ok(result) => result,
        Err(e) => {
            log::error!("Scrape task did not complete: {}", e);
            ScrapeResult::failed(requested, 0, ScrapeFailure::Aborted(e.to_string()))
        }
    };

    respond(result)
}

fn respond(result: ScrapeResult) -> HttpResponse {
    if !result.is_success() {
        let summary = result
            .failure
            .as_ref()
            .map(ScrapeFailure::summary)
            .unwrap_or("scrape failed");
        return failure_response(summary);
    }

    HttpResponse::Ok().json(json!({
        "success": true,
        "count": result.records.len(),
        "results": result.records,
    }))
}
