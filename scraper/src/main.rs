//! Job board scraper CLI.
//!
//! Runs one search from the configured `search` section and prints the
//! result as JSON on stdout. Logs go to stderr.

use anyhow::Context;
use job_scraper::{telemetry, ScrapeRequest, Scraper, Settings};
use tracing::info;

fn main() -> anyhow::Result<()> {
    telemetry::init_telemetry();

    let settings = Settings::new().context("failed to load settings")?;
    let scraper = Scraper::from_settings(&settings)?;

    let mut request = ScrapeRequest::new(&settings.search.query, &settings.search.location);
    request.max_pages = settings.search.max_pages;

    info!(
        source = scraper.source(),
        query = %request.query,
        location = %request.location,
        "starting scraper"
    );
    let result = scraper.scrape(&request);

    for (n, job) in result.jobs().iter().take(3).enumerate() {
        info!(
            "{}. {} | {} | {} | {}",
            n + 1,
            job.title,
            job.company,
            job.location,
            job.salary
        );
    }

    let json = serde_json::to_string_pretty(&result).context("failed to serialize result")?;
    println!("{}", json);

    match result.error() {
        Some(error) => anyhow::bail!("scrape failed: {}", error),
        None => Ok(()),
    }
}
