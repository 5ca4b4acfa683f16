pub mod card_locator;
pub mod droid;
pub mod field_extractor;
pub mod maps_scraper;
pub mod navigation;
pub mod page_driver;
pub mod pagination;
pub mod record_assembler;
pub mod result_collector;

#[cfg(test)]
pub mod fake_driver;

pub use card_locator::*;
pub use droid::*;
pub use field_extractor::*;
pub use maps_scraper::*;
pub use navigation::*;
pub use page_driver::*;
pub use pagination::*;
pub use record_assembler::*;
pub use result_collector::*;
