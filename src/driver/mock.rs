use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use url::Url;

use super::PageDriver;
use crate::{ScraperError, ScraperResult};

/// Everything a test might want to assert about driver usage.
#[derive(Debug, Clone, Default)]
pub struct DriverLog {
    pub navigations: Vec<String>,
    pub waits: Vec<String>,
    pub clicks: Vec<String>,
    pub typed: Vec<(String, String)>,
    pub scrolls: usize,
    pub expand_sweeps: usize,
    pub slept: Vec<Duration>,
}

/// Scripted stand-in for a real browser page.
///
/// Serves a fixed sequence of rendered-count readings (repeating the last one
/// once exhausted, the way a fully-loaded page keeps reporting the same
/// count), a canned HTML snapshot, and records every driver call. `sleep`
/// records the requested duration without actually sleeping, so backoff
/// sequences can be asserted on without slowing tests down.
#[derive(Clone)]
pub struct MockDriver {
    counts: Arc<Vec<usize>>,
    count_cursor: Arc<AtomicUsize>,
    fail_count_at: Option<usize>,
    missing_elements: Arc<HashSet<String>>,
    counter_text: Option<String>,
    html: String,
    log: Arc<RwLock<DriverLog>>,
}

impl MockDriver {
    pub fn new(counts: Vec<usize>) -> Self {
        Self {
            counts: Arc::new(counts),
            count_cursor: Arc::new(AtomicUsize::new(0)),
            fail_count_at: None,
            missing_elements: Arc::new(HashSet::new()),
            counter_text: None,
            html: String::new(),
            log: Arc::new(RwLock::new(DriverLog::default())),
        }
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = html.into();
        self
    }

    /// Text served for the advisory review counter element.
    pub fn with_counter_text(mut self, text: impl Into<String>) -> Self {
        self.counter_text = Some(text.into());
        self
    }

    /// Makes the n-th `query_count` call (0-based) fail.
    pub fn with_count_failure(mut self, at: usize) -> Self {
        self.fail_count_at = Some(at);
        self
    }

    /// Makes `wait_for_element` time out for `selector`.
    pub fn with_missing_element(mut self, selector: impl Into<String>) -> Self {
        let mut missing = (*self.missing_elements).clone();
        missing.insert(selector.into());
        self.missing_elements = Arc::new(missing);
        self
    }

    pub fn log(&self) -> DriverLog {
        self.log.read().clone()
    }
}

#[async_trait]
impl PageDriver for MockDriver {
    async fn navigate(&self, url: &Url) -> ScraperResult<()> {
        self.log.write().navigations.push(url.to_string());
        Ok(())
    }

    async fn wait_for_element(&self, selector: &str) -> ScraperResult<()> {
        self.log.write().waits.push(selector.to_string());
        if self.missing_elements.contains(selector) {
            return Err(ScraperError::Navigation(format!(
                "timed out waiting for element {selector}"
            )));
        }
        Ok(())
    }

    async fn click(&self, selector: &str) -> ScraperResult<()> {
        self.log.write().clicks.push(selector.to_string());
        Ok(())
    }

    async fn type_text(&self, selector: &str, text: &str) -> ScraperResult<()> {
        self.log
            .write()
            .typed
            .push((selector.to_string(), text.to_string()));
        Ok(())
    }

    async fn query_count(&self, _selector: &str) -> ScraperResult<usize> {
        let index = self.count_cursor.fetch_add(1, Ordering::SeqCst);
        if self.fail_count_at == Some(index) {
            return Err(ScraperError::Browser("connection lost".to_string()));
        }
        Ok(match self.counts.last() {
            Some(last) => *self.counts.get(index).unwrap_or(last),
            None => 0,
        })
    }

    async fn inner_text(&self, _selector: &str) -> ScraperResult<Option<String>> {
        Ok(self.counter_text.clone())
    }

    async fn scroll_to_end(&self, _selector: &str) -> ScraperResult<()> {
        self.log.write().scrolls += 1;
        Ok(())
    }

    async fn click_all(&self, _selector: &str) -> ScraperResult<usize> {
        self.log.write().expand_sweeps += 1;
        Ok(0)
    }

    async fn page_html(&self) -> ScraperResult<String> {
        Ok(self.html.clone())
    }

    async fn sleep(&self, duration: Duration) {
        self.log.write().slept.push(duration);
    }
}
