use std::time::Duration;

use super::*;
use crate::driver::MockDriver;
use crate::navigation;

fn quick_config() -> LoaderConfig {
    LoaderConfig {
        base_delay: Duration::from_millis(10),
        delay_increment: Duration::from_millis(10),
        delay_ceiling: Duration::from_millis(40),
        max_stalls: 3,
    }
}

#[test]
fn rendered_count_never_decreases() {
    let config = LoaderConfig::default();
    let mut state = LoaderState::new(10, &config);
    let mut seen = Vec::new();

    for count in [3, 1, 5, 2, 5] {
        state.observe(count, &config);
        seen.push(state.rendered_count());
    }

    assert_eq!(seen, vec![3, 3, 5, 5, 5]);
}

#[test]
fn stalls_grow_delay_up_to_ceiling() {
    let config = LoaderConfig::default();
    let mut state = LoaderState::new(100, &config);
    state.observe(1, &config);

    for n in 1..=15u32 {
        state.observe(1, &config);
        let expected = std::cmp::min(
            config.base_delay + config.delay_increment * n,
            config.delay_ceiling,
        );
        assert_eq!(state.current_delay(), expected, "after {} stalls", n);
    }
}

#[test]
fn progress_resets_delay_and_streak() {
    let config = LoaderConfig::default();
    let mut state = LoaderState::new(100, &config);

    state.observe(1, &config);
    assert_eq!(state.observe(1, &config), Progress::Stalled);
    assert_eq!(state.observe(1, &config), Progress::Stalled);
    assert_eq!(state.stall_streak(), 2);
    assert!(state.current_delay() > config.base_delay);

    assert_eq!(state.observe(4, &config), Progress::Advanced);
    assert_eq!(state.stall_streak(), 0);
    assert_eq!(state.current_delay(), config.base_delay);
}

#[tokio::test]
async fn terminates_when_target_reached() {
    let driver = MockDriver::new(vec![2, 2, 4, 5]);
    let loader = IncrementalScrollLoader::new(&driver, navigation::review_list_targets());

    let report = loader.run(5).await.unwrap();

    assert_eq!(report.outcome, LoadOutcome::ReachedTarget);
    assert_eq!(report.rendered_count, 5);
    assert_eq!(report.iterations, 4);
    assert_eq!(report.stalls, 1);

    // Delay slept per iteration: base, base (reset after progress),
    // doubled after the stall, then reset again.
    let base = LoaderConfig::default().base_delay;
    assert_eq!(driver.log().slept, vec![base, base, base * 2, base]);
    assert_eq!(driver.log().scrolls, 4);
    assert_eq!(driver.log().expand_sweeps, 4);
}

#[tokio::test]
async fn declares_exhaustion_after_max_stalls() {
    // The page only ever renders 2 of the 10 advertised reviews.
    let driver = MockDriver::new(vec![2]);
    let loader = IncrementalScrollLoader::new(&driver, navigation::review_list_targets())
        .with_config(quick_config());

    let report = loader.run(10).await.unwrap();

    assert_eq!(report.outcome, LoadOutcome::Exhausted);
    assert_eq!(report.rendered_count, 2);
    assert_eq!(report.stalls, 3);
    assert_eq!(report.iterations, 4);
}

#[tokio::test]
async fn zero_target_finishes_after_one_sweep() {
    let driver = MockDriver::new(vec![0]);
    let loader = IncrementalScrollLoader::new(&driver, navigation::review_list_targets())
        .with_config(quick_config());

    let report = loader.run(0).await.unwrap();

    assert_eq!(report.outcome, LoadOutcome::ReachedTarget);
    assert_eq!(report.iterations, 1);
    // The termination check runs at the end of the iteration, so even an
    // empty list gets one scroll and expand sweep.
    assert_eq!(driver.log().scrolls, 1);
    assert_eq!(driver.log().expand_sweeps, 1);
}

#[tokio::test]
async fn driver_failure_aborts_the_loop() {
    let driver = MockDriver::new(vec![2, 3]).with_count_failure(1);
    let loader = IncrementalScrollLoader::new(&driver, navigation::review_list_targets())
        .with_config(quick_config());

    let err = loader.run(10).await.unwrap_err();

    match err {
        ScraperError::Loading(msg) => assert!(msg.contains("rendered count")),
        other => panic!("expected loading error, got {other:?}"),
    }
}
