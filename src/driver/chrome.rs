use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig, HeadlessMode};
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use futures::StreamExt;
use log::{info, warn};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use url::Url;

use super::PageDriver;
use crate::{ScraperError, ScraperResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const ELEMENT_TIMEOUT: Duration = Duration::from_secs(10);
const ELEMENT_POLL: Duration = Duration::from_millis(200);

fn cdp(e: CdpError) -> ScraperError {
    ScraperError::Browser(e.to_string())
}

// Selectors are spliced into injected JS expressions; single quotes and
// backslashes must not break out of the literal.
fn js_quote(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Chromium-backed implementation of [`PageDriver`].
///
/// Owns the browser process, its CDP event handler task, and a single page;
/// one driver is one scraping session. Dropping the driver aborts the
/// handler, kills the browser child process, and removes the temporary
/// profile directory.
pub struct ChromeDriver {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    user_data_dir: Option<PathBuf>,
}

impl ChromeDriver {
    pub async fn launch() -> ScraperResult<Self> {
        info!("Launching headless browser");

        let user_data_dir =
            std::env::temp_dir().join(format!("reviewscraper_{}", std::process::id()));
        std::fs::create_dir_all(&user_data_dir)?;

        let config = BrowserConfig::builder()
            .request_timeout(REQUEST_TIMEOUT)
            .window_size(1920, 1080)
            .user_data_dir(&user_data_dir)
            .headless_mode(HeadlessMode::default())
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-notifications")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .build()
            .map_err(ScraperError::Browser)?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(cdp)?;

        // The handler must be polled for the lifetime of the browser; it is
        // aborted on drop so it cannot outlive the session.
        let handler_task = tokio::spawn(async move {
            while handler.next().await.is_some() {}
        });

        let page = browser.new_page("about:blank").await.map_err(cdp)?;

        info!("Browser initialized");
        Ok(Self {
            browser,
            page,
            handler: handler_task,
            user_data_dir: Some(user_data_dir),
        })
    }

    /// Graceful teardown. Falls back to `Drop` cleanup when skipped (for
    /// example when a run aborts early with an error).
    pub async fn shutdown(&mut self) -> ScraperResult<()> {
        self.browser.close().await.map_err(cdp)?;
        self.browser.wait().await.map_err(|e| ScraperError::Browser(e.to_string()))?;
        self.handler.abort();
        self.remove_profile_dir();
        Ok(())
    }

    fn remove_profile_dir(&mut self) {
        if let Some(dir) = self.user_data_dir.take() {
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                warn!("Failed to remove browser profile {}: {}", dir.display(), e);
            }
        }
    }

    async fn evaluate<T: serde::de::DeserializeOwned>(&self, expr: String) -> ScraperResult<T> {
        self.page
            .evaluate(expr)
            .await
            .map_err(cdp)?
            .into_value::<T>()
            .map_err(|e| ScraperError::Browser(format!("decoding evaluation result: {e}")))
    }
}

impl Drop for ChromeDriver {
    fn drop(&mut self) {
        self.handler.abort();
        // Browser's own Drop kills the Chrome child process.
        self.remove_profile_dir();
    }
}

#[async_trait]
impl PageDriver for ChromeDriver {
    async fn navigate(&self, url: &Url) -> ScraperResult<()> {
        self.page.goto(url.as_str()).await.map_err(cdp)?;
        self.page.wait_for_navigation().await.map_err(cdp)?;
        Ok(())
    }

    async fn wait_for_element(&self, selector: &str) -> ScraperResult<()> {
        let deadline = Instant::now() + ELEMENT_TIMEOUT;
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(ScraperError::Navigation(format!(
                    "timed out waiting for element {selector}"
                )));
            }
            sleep(ELEMENT_POLL).await;
        }
    }

    async fn click(&self, selector: &str) -> ScraperResult<()> {
        let element = self.page.find_element(selector).await.map_err(cdp)?;
        element.click().await.map_err(cdp)?;
        Ok(())
    }

    async fn type_text(&self, selector: &str, text: &str) -> ScraperResult<()> {
        let element = self.page.find_element(selector).await.map_err(cdp)?;
        element.click().await.map_err(cdp)?;
        element.type_str(text).await.map_err(cdp)?;
        Ok(())
    }

    async fn query_count(&self, selector: &str) -> ScraperResult<usize> {
        let expr = format!(
            "document.querySelectorAll({}).length",
            js_quote(selector)
        );
        self.evaluate(expr).await
    }

    async fn inner_text(&self, selector: &str) -> ScraperResult<Option<String>> {
        let expr = format!(
            "(() => {{ const el = document.querySelector({}); return el ? el.innerText : null; }})()",
            js_quote(selector)
        );
        self.evaluate(expr).await
    }

    async fn scroll_to_end(&self, selector: &str) -> ScraperResult<()> {
        let expr = format!(
            "(() => {{ const el = document.querySelector({0}); if (!el) return false; el.scrollTop = el.scrollHeight; return true; }})()",
            js_quote(selector)
        );
        let found: bool = self.evaluate(expr).await?;
        if !found {
            return Err(ScraperError::Browser(format!(
                "no element matches {selector}"
            )));
        }
        Ok(())
    }

    async fn click_all(&self, selector: &str) -> ScraperResult<usize> {
        let expr = format!(
            "(() => {{ const els = document.querySelectorAll({}); els.forEach((el) => el.click()); return els.length; }})()",
            js_quote(selector)
        );
        self.evaluate(expr).await
    }

    async fn page_html(&self) -> ScraperResult<String> {
        self.page.content().await.map_err(cdp)
    }

    async fn sleep(&self, duration: Duration) {
        sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::js_quote;

    #[test]
    fn js_quote_escapes_embedded_quotes() {
        assert_eq!(js_quote("div.a"), "'div.a'");
        assert_eq!(
            js_quote("div[aria-label=\"Suggestions\"]"),
            "'div[aria-label=\"Suggestions\"]'"
        );
        assert_eq!(js_quote("a'b"), r"'a\'b'");
        assert_eq!(js_quote(r"a\b"), r"'a\\b'");
    }
}
