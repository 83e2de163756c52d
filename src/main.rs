use log::{error, info};

use reviewscraper::{storage, ChromeDriver, ReviewScraper, ScraperError, ScraperResult};

#[tokio::main]
async fn main() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();

    if let Err(e) = run().await {
        error!("Error occurred: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> ScraperResult<()> {
    let business = std::env::args().nth(1).ok_or(ScraperError::Usage)?;

    let mut driver = ChromeDriver::launch().await?;

    let scraper = ReviewScraper::new(&driver);
    let reviews = scraper.run(&business).await?;
    scraper.stats().print_summary();

    let path = storage::write_review_set(".", &business, &reviews)?;
    info!(
        "Reviews scraped successfully for {}, please check {}",
        business,
        path.display()
    );

    driver.shutdown().await?;
    Ok(())
}
