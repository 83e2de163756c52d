use std::cmp;
use std::time::Duration;

use log::{debug, info, warn};

use crate::driver::PageDriver;
use crate::{ScraperError, ScraperResult};

#[cfg(test)]
mod tests;

/// Backoff policy for the incremental loader.
///
/// Each stalled iteration stretches the wait by `delay_increment`, capped at
/// `delay_ceiling`; any progress snaps it back to `base_delay`. `max_stalls`
/// bounds consecutive stalls so an inflated advisory total cannot spin the
/// loop forever.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub base_delay: Duration,
    pub delay_increment: Duration,
    pub delay_ceiling: Duration,
    pub max_stalls: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(1000),
            delay_increment: Duration::from_millis(1000),
            delay_ceiling: Duration::from_millis(10000),
            // Nine stalls walk the delay up to the ceiling; three more full
            // waits there before the list is declared exhausted.
            max_stalls: 12,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Advanced,
    Stalled,
}

/// Transient loop state, owned by the loader and discarded at termination.
#[derive(Debug, Clone)]
pub struct LoaderState {
    rendered_count: usize,
    target_count: usize,
    stall_streak: usize,
    current_delay: Duration,
}

impl LoaderState {
    pub fn new(target_count: usize, config: &LoaderConfig) -> Self {
        Self {
            rendered_count: 0,
            target_count,
            stall_streak: 0,
            current_delay: config.base_delay,
        }
    }

    /// Feeds one rendered-count reading into the state machine.
    ///
    /// `rendered_count` only ever ratchets upward; the host page never
    /// un-renders items within a session, so a lower reading counts as a
    /// stall rather than a regression.
    pub fn observe(&mut self, count: usize, config: &LoaderConfig) -> Progress {
        if count > self.rendered_count {
            self.rendered_count = count;
            self.stall_streak = 0;
            self.current_delay = config.base_delay;
            Progress::Advanced
        } else {
            self.stall_streak += 1;
            self.current_delay = cmp::min(
                self.current_delay + config.delay_increment,
                config.delay_ceiling,
            );
            Progress::Stalled
        }
    }

    pub fn is_complete(&self) -> bool {
        self.rendered_count >= self.target_count
    }

    pub fn is_exhausted(&self, config: &LoaderConfig) -> bool {
        self.stall_streak >= config.max_stalls
    }

    pub fn rendered_count(&self) -> usize {
        self.rendered_count
    }

    pub fn stall_streak(&self) -> usize {
        self.stall_streak
    }

    pub fn current_delay(&self) -> Duration {
        self.current_delay
    }
}

/// Selectors the loader drives: the scrollable container, the per-review
/// item, and the "show more" affordance inside truncated reviews.
#[derive(Debug, Clone)]
pub struct ScrollTargets {
    pub container: &'static str,
    pub item: &'static str,
    pub expand: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The rendered count reached the advisory target.
    ReachedTarget,
    /// The list stopped growing before the target; whatever is rendered is
    /// all the page will give us.
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub outcome: LoadOutcome,
    pub rendered_count: usize,
    pub iterations: usize,
    pub stalls: usize,
}

/// Drives the virtualized review list until `target_count` items are rendered
/// or loading demonstrably stalls out.
pub struct IncrementalScrollLoader<'a> {
    driver: &'a dyn PageDriver,
    targets: ScrollTargets,
    config: LoaderConfig,
}

impl<'a> IncrementalScrollLoader<'a> {
    pub fn new(driver: &'a dyn PageDriver, targets: ScrollTargets) -> Self {
        Self {
            driver,
            targets,
            config: LoaderConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs the scroll/wait/expand loop. Any driver failure is fatal and
    /// propagates immediately; the loop itself has no error state.
    pub async fn run(&self, target_count: usize) -> ScraperResult<LoadReport> {
        info!("Loading review list (advertised total: {})", target_count);

        let mut state = LoaderState::new(target_count, &self.config);
        let mut iterations = 0;
        let mut stalls = 0;

        loop {
            iterations += 1;

            let count = self
                .driver
                .query_count(self.targets.item)
                .await
                .map_err(|e| ScraperError::Loading(format!("reading rendered count: {e}")))?;

            self.driver
                .scroll_to_end(self.targets.container)
                .await
                .map_err(|e| ScraperError::Loading(format!("scrolling review list: {e}")))?;

            self.driver.sleep(state.current_delay()).await;

            self.driver
                .click_all(self.targets.expand)
                .await
                .map_err(|e| {
                    ScraperError::Loading(format!("expanding truncated reviews: {e}"))
                })?;

            info!("Loaded reviews: {}", count);

            if state.observe(count, &self.config) == Progress::Stalled {
                stalls += 1;
                debug!(
                    "No new reviews rendered (streak: {}, next delay: {:?})",
                    state.stall_streak(),
                    state.current_delay()
                );
            }

            if state.is_complete() {
                return Ok(LoadReport {
                    outcome: LoadOutcome::ReachedTarget,
                    rendered_count: state.rendered_count(),
                    iterations,
                    stalls,
                });
            }

            if state.is_exhausted(&self.config) {
                warn!(
                    "Review list stopped growing at {} of {} advertised, giving up",
                    state.rendered_count(),
                    target_count
                );
                return Ok(LoadReport {
                    outcome: LoadOutcome::Exhausted,
                    rendered_count: state.rendered_count(),
                    iterations,
                    stalls,
                });
            }
        }
    }
}
