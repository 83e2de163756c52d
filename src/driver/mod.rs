pub mod chrome;
pub mod mock;

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::ScraperResult;

pub use chrome::ChromeDriver;
pub use mock::MockDriver;

/// Capability interface over the automated page.
///
/// The core components only ever talk to the page through this trait, so the
/// loading and extraction logic can be exercised against a fake driver in
/// tests without a live browser.
#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn navigate(&self, url: &Url) -> ScraperResult<()>;

    /// Blocks until an element matching `selector` exists, or fails after a
    /// bounded wait.
    async fn wait_for_element(&self, selector: &str) -> ScraperResult<()>;

    async fn click(&self, selector: &str) -> ScraperResult<()>;

    async fn type_text(&self, selector: &str, text: &str) -> ScraperResult<()>;

    /// Number of elements currently matching `selector`.
    async fn query_count(&self, selector: &str) -> ScraperResult<usize>;

    /// Inner text of the first element matching `selector`, `None` when no
    /// element matches.
    async fn inner_text(&self, selector: &str) -> ScraperResult<Option<String>>;

    /// Scrolls the first element matching `selector` to its very end.
    async fn scroll_to_end(&self, selector: &str) -> ScraperResult<()>;

    /// Clicks every element matching `selector`, returning how many were hit.
    /// Clicking an already-expanded affordance is a no-op on the host page.
    async fn click_all(&self, selector: &str) -> ScraperResult<usize>;

    /// Snapshot of the current page HTML.
    async fn page_html(&self) -> ScraperResult<String>;

    async fn sleep(&self, duration: Duration);
}
