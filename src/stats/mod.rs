use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ScrapeStats {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub loader_iterations: usize,
    pub stalled_iterations: usize,
    pub rendered_reviews: usize,
    pub extracted_reviews: usize,
}

/// Per-run counters, shared behind a lock so the scraper can record while a
/// caller holds a handle for the final summary.
#[derive(Debug, Clone)]
pub struct RunStats {
    stats: Arc<RwLock<ScrapeStats>>,
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(RwLock::new(ScrapeStats {
                start_time: Utc::now(),
                end_time: None,
                loader_iterations: 0,
                stalled_iterations: 0,
                rendered_reviews: 0,
                extracted_reviews: 0,
            })),
        }
    }

    pub fn record_loading(&self, iterations: usize, stalls: usize, rendered: usize) {
        let mut stats = self.stats.write();
        stats.loader_iterations = iterations;
        stats.stalled_iterations = stalls;
        stats.rendered_reviews = rendered;
    }

    pub fn record_extraction(&self, extracted: usize) {
        self.stats.write().extracted_reviews = extracted;
    }

    pub fn finish(&self) {
        self.stats.write().end_time = Some(Utc::now());
    }

    pub fn get_stats(&self) -> ScrapeStats {
        self.stats.read().clone()
    }

    pub fn print_summary(&self) {
        let stats = self.stats.read();
        let duration = stats
            .end_time
            .unwrap_or_else(Utc::now)
            .signed_duration_since(stats.start_time);

        println!("\nScraping Statistics:");
        println!("===================");
        println!("Duration: {} seconds", duration.num_seconds());
        println!("Loader Iterations: {}", stats.loader_iterations);
        println!("Stalled Iterations: {}", stats.stalled_iterations);
        println!("Reviews Rendered: {}", stats.rendered_reviews);
        println!("Reviews Extracted: {}", stats.extracted_reviews);
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}
