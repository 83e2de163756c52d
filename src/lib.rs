pub mod core;
pub mod driver;
pub mod extract;
pub mod navigation;
pub mod stats;
pub mod storage;

pub use crate::core::loader::{IncrementalScrollLoader, LoadOutcome, LoaderConfig, LoaderState};
pub use crate::core::{ReviewScraper, ScraperError, ScraperResult};
pub use driver::{ChromeDriver, MockDriver, PageDriver};
pub use extract::{ReviewRecord, ReviewSet};
pub use stats::RunStats;
