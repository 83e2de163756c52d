use log::info;

use crate::core::loader::{IncrementalScrollLoader, LoadOutcome, LoaderConfig};
use crate::driver::PageDriver;
use crate::extract::{self, ReviewSet};
use crate::navigation;
use crate::stats::RunStats;
use crate::{ScraperError, ScraperResult};

/// One scraping run against one business page.
///
/// Holds the single thread of control: navigation, then the incremental
/// loader (the only thing that mutates page state), then exactly one
/// extraction pass over the final snapshot.
pub struct ReviewScraper<'a> {
    driver: &'a dyn PageDriver,
    loader_config: LoaderConfig,
    stats: RunStats,
}

impl<'a> ReviewScraper<'a> {
    pub fn new(driver: &'a dyn PageDriver) -> Self {
        Self {
            driver,
            loader_config: LoaderConfig::default(),
            stats: RunStats::new(),
        }
    }

    pub fn with_loader_config(mut self, config: LoaderConfig) -> Self {
        self.loader_config = config;
        self
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub async fn run(&self, business: &str) -> ScraperResult<ReviewSet> {
        info!("Starting scraping process for {}", business);

        navigation::open_business_reviews(self.driver, business).await?;
        let target = navigation::advisory_total(self.driver).await?;

        let loader = IncrementalScrollLoader::new(self.driver, navigation::review_list_targets())
            .with_config(self.loader_config.clone());
        let report = loader.run(target).await?;
        self.stats
            .record_loading(report.iterations, report.stalls, report.rendered_count);

        if report.outcome == LoadOutcome::Exhausted {
            info!(
                "Proceeding with {} rendered review(s) out of {} advertised",
                report.rendered_count, target
            );
        }

        let html = self
            .driver
            .page_html()
            .await
            .map_err(|e| ScraperError::Extraction(format!("reading page snapshot: {e}")))?;
        let reviews = extract::extract_reviews(&html)?;
        self.stats.record_extraction(reviews.len());

        info!(
            "Successfully scraped {} out of {} review(s) for {}",
            reviews.len(),
            target,
            business
        );
        self.stats.finish();
        Ok(reviews)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::driver::MockDriver;

    fn review_row(name: &str, stars: &str, date: &str, text: &str) -> String {
        format!(
            r#"<div class="jftiEf fontBodyMedium">
                 <div class="d4r55">{name}</div>
                 <span class="kvMYJc" aria-label="{stars}"></span>
                 <span class="rsqaWe">{date}</span>
                 <span class="wiI7pd">{text}</span>
               </div>"#
        )
    }

    fn five_review_page() -> String {
        let rows: String = [
            ("Alice", "5 stars", "a week ago", "Fantastic service."),
            ("Bob", "4 stars", "2 weeks ago", "Pretty good overall."),
            ("Carol", "3 stars", "a month ago", "Average experience."),
            ("Dan", "5 stars", "3 months ago", "Would come back."),
            ("Eve", "1 star", "a year ago", "Not for me."),
        ]
        .iter()
        .map(|&(n, s, d, t)| review_row(n, s, d, t))
        .collect();
        format!("<html><body>{rows}</body></html>")
    }

    #[tokio::test]
    async fn full_run_loads_then_extracts_once() {
        let driver = MockDriver::new(vec![2, 2, 4, 5])
            .with_counter_text("5 reviews")
            .with_html(five_review_page());

        let scraper = ReviewScraper::new(&driver);
        let reviews = scraper.run("Blue Bottle Coffee").await.unwrap();

        assert_eq!(reviews.len(), 5);
        for (_, record) in reviews.iter() {
            assert!(!record.name.is_empty());
            assert!(!record.stars.is_empty());
            assert!(!record.date.is_empty());
            assert!(!record.text.is_empty());
        }

        let keys: Vec<String> = reviews.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["review1", "review2", "review3", "review4", "review5"]);

        // One settle wait from navigation, then the loader's delays: base,
        // base, doubled after the single stall, base again.
        let base = Duration::from_millis(1000);
        assert_eq!(
            driver.log().slept,
            vec![Duration::from_secs(5), base, base, base * 2, base]
        );

        let stats = scraper.stats().get_stats();
        assert_eq!(stats.loader_iterations, 4);
        assert_eq!(stats.stalled_iterations, 1);
        assert_eq!(stats.rendered_reviews, 5);
        assert_eq!(stats.extracted_reviews, 5);
    }

    #[tokio::test]
    async fn exhausted_list_still_yields_what_rendered() {
        let page = format!(
            "<html><body>{}{}</body></html>",
            review_row("Alice", "5 stars", "a week ago", "Fantastic."),
            review_row("Bob", "4 stars", "2 weeks ago", "Good."),
        );
        let driver = MockDriver::new(vec![2])
            .with_counter_text("10 reviews")
            .with_html(page);

        let config = LoaderConfig {
            base_delay: Duration::from_millis(10),
            delay_increment: Duration::from_millis(10),
            delay_ceiling: Duration::from_millis(40),
            max_stalls: 3,
        };
        let scraper = ReviewScraper::new(&driver).with_loader_config(config);
        let reviews = scraper.run("Sparse Cafe").await.unwrap();

        assert_eq!(reviews.len(), 2);
        assert_eq!(scraper.stats().get_stats().rendered_reviews, 2);
    }

    #[tokio::test]
    async fn navigation_failure_aborts_before_loading() {
        let driver = MockDriver::new(vec![2, 5])
            .with_counter_text("5 reviews")
            .with_missing_element("div[role=\"tablist\"]");

        let scraper = ReviewScraper::new(&driver);
        let err = scraper.run("Nowhere Inn").await.unwrap_err();

        assert!(matches!(err, ScraperError::Navigation(_)));
        // The loader never ran.
        assert_eq!(driver.log().scrolls, 0);
    }
}
