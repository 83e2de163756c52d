use std::time::Duration;

use log::info;
use regex::Regex;
use url::Url;

use crate::core::loader::ScrollTargets;
use crate::driver::PageDriver;
use crate::{ScraperError, ScraperResult};

pub const MAPS_URL: &str = "https://www.google.com/maps";

const SEARCH_BOX: &str = "input[id=\"searchboxinput\"]";
const FIRST_SUGGESTION: &str = "div[aria-label=\"Suggestions\"] > div[data-index=\"0\"]";
const REVIEWS_TAB: &str = "div[role=\"tablist\"]";
const TOTAL_COUNTER: &str =
    "div.m6QErb.DxyBCb.kA9KIf.dS8AEf > div.PPCwl > div > div.jANrlb > div.fontBodySmall";

const REVIEW_PANE: &str = "div.m6QErb.DxyBCb.kA9KIf.dS8AEf";
const REVIEW_ITEM: &str = "div.jftiEf.fontBodyMedium";
const EXPAND_BUTTON: &str = ".MyEned > span:nth-child(2) > button";

// The review pane keeps rendering for a while after the tab click.
const SETTLE_DELAY: Duration = Duration::from_secs(5);

pub fn review_list_targets() -> ScrollTargets {
    ScrollTargets {
        container: REVIEW_PANE,
        item: REVIEW_ITEM,
        expand: EXPAND_BUTTON,
    }
}

/// Scripted click-through from the maps landing page to an open review list
/// for `business`. Strictly sequential; any step failing aborts the run.
pub async fn open_business_reviews(
    driver: &dyn PageDriver,
    business: &str,
) -> ScraperResult<()> {
    let url = Url::parse(MAPS_URL)?;

    info!("Navigating to {}", MAPS_URL);
    driver
        .navigate(&url)
        .await
        .map_err(|e| ScraperError::Navigation(format!("opening {MAPS_URL}: {e}")))?;

    driver.wait_for_element(SEARCH_BOX).await?;
    driver
        .click(SEARCH_BOX)
        .await
        .map_err(|e| ScraperError::Navigation(format!("focusing search box: {e}")))?;

    info!("Searching for {}", business);
    driver
        .type_text(SEARCH_BOX, business)
        .await
        .map_err(|e| ScraperError::Navigation(format!("typing search query: {e}")))?;

    driver.wait_for_element(FIRST_SUGGESTION).await?;
    driver
        .click(FIRST_SUGGESTION)
        .await
        .map_err(|e| ScraperError::Navigation(format!("selecting first suggestion: {e}")))?;

    driver.wait_for_element(REVIEWS_TAB).await?;
    driver
        .click(REVIEWS_TAB)
        .await
        .map_err(|e| ScraperError::Navigation(format!("opening reviews tab: {e}")))?;

    driver.sleep(SETTLE_DELAY).await;
    Ok(())
}

/// Reads the advisory review total displayed next to the list.
///
/// The page rounds and sometimes undercounts this number; it is a loop
/// target, never a hard bound on how many reviews will actually render.
pub async fn advisory_total(driver: &dyn PageDriver) -> ScraperResult<usize> {
    let text = driver
        .inner_text(TOTAL_COUNTER)
        .await
        .map_err(|e| ScraperError::Navigation(format!("reading review counter: {e}")))?
        .ok_or_else(|| ScraperError::Navigation("review counter not found".to_string()))?;

    let total = parse_advisory_total(&text)?;
    info!("Total reviews found: {}", total);
    Ok(total)
}

fn parse_advisory_total(text: &str) -> ScraperResult<usize> {
    let number = Regex::new(r"[0-9][0-9.,]*")
        .map_err(|e| ScraperError::Navigation(format!("counter pattern: {e}")))?;

    let token = number
        .find(text)
        .ok_or_else(|| {
            ScraperError::Navigation(format!("unparsable review counter: {text:?}"))
        })?
        .as_str();

    let digits: String = token.chars().filter(char::is_ascii_digit).collect();
    digits
        .parse()
        .map_err(|e| ScraperError::Navigation(format!("unparsable review counter {token:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::MockDriver;

    #[test]
    fn parses_plain_and_separated_totals() {
        assert_eq!(parse_advisory_total("5 reviews").unwrap(), 5);
        assert_eq!(parse_advisory_total("1,234 reviews").unwrap(), 1234);
        assert_eq!(parse_advisory_total("2.741 Rezensionen").unwrap(), 2741);
        assert_eq!(parse_advisory_total("817").unwrap(), 817);
    }

    #[test]
    fn rejects_counter_without_a_number() {
        assert!(parse_advisory_total("No reviews yet").is_err());
        assert!(parse_advisory_total("").is_err());
    }

    #[tokio::test]
    async fn walks_the_search_sequence_in_order() {
        let driver = MockDriver::new(vec![]);
        open_business_reviews(&driver, "Blue Bottle Coffee")
            .await
            .unwrap();

        let log = driver.log();
        assert_eq!(log.navigations, vec![format!("{MAPS_URL}")]);
        assert_eq!(
            log.clicks,
            vec![
                SEARCH_BOX.to_string(),
                FIRST_SUGGESTION.to_string(),
                REVIEWS_TAB.to_string()
            ]
        );
        assert_eq!(
            log.typed,
            vec![(SEARCH_BOX.to_string(), "Blue Bottle Coffee".to_string())]
        );
        assert_eq!(log.slept, vec![SETTLE_DELAY]);
    }

    #[tokio::test]
    async fn missing_search_box_is_a_navigation_failure() {
        let driver = MockDriver::new(vec![]).with_missing_element(SEARCH_BOX);
        let err = open_business_reviews(&driver, "Anywhere").await.unwrap_err();
        assert!(matches!(err, ScraperError::Navigation(_)));
    }

    #[tokio::test]
    async fn missing_counter_is_a_navigation_failure() {
        let driver = MockDriver::new(vec![]);
        let err = advisory_total(&driver).await.unwrap_err();
        assert!(matches!(err, ScraperError::Navigation(_)));
    }

    #[tokio::test]
    async fn counter_text_resolves_to_target() {
        let driver = MockDriver::new(vec![]).with_counter_text("1,234 reviews");
        assert_eq!(advisory_total(&driver).await.unwrap(), 1234);
    }
}
