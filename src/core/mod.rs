mod errors;
mod scrape;
pub mod loader;

pub use errors::{ScraperError, ScraperResult};
pub use scrape::ReviewScraper;
