pub mod field_parsers;
pub mod field_value;
pub mod listing;
pub mod maps_url;
pub mod scrape_run;
pub mod search_request;
pub mod strategy;
