//! Job board scraper.
//!
//! Walks the paginated search results of a job board, reads each listing
//! card through per-field selector cascades and returns the postings as a
//! [`ScrapeResult`]. Fetching is sequential and paced with randomized pauses;
//! a failed page fails the whole run, while a malformed card is only skipped.
//!
//! ```no_run
//! use job_scraper::ScrapeRequest;
//!
//! let result = job_scraper::scrape(&ScrapeRequest::new("Python Developer", "Cape Town"));
//! println!("{} jobs", result.count());
//! ```

pub mod aggregate;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod pacing;
pub mod site;
pub mod telemetry;

pub use aggregate::scrape_sources;
pub use common::{AggregateResult, JobPosting, JobType, ScrapeRequest, ScrapeResult};
pub use config::Settings;
pub use error::{ExtractError, ScrapeError};
pub use extract::Extractor;
pub use fetch::{HttpPageSource, PageSource, Scraper};
pub use pacing::{DelayRange, Pacing, Pause, ThreadSleep};
pub use site::{IndeedSite, PnetSite, Site, SiteAdapter};

/// Scrapes Indeed with the default browser profile and pacing.
pub fn scrape(request: &ScrapeRequest) -> ScrapeResult {
    match Scraper::indeed() {
        Ok(scraper) => scraper.scrape(request),
        Err(e) => ScrapeResult::failed(IndeedSite::SOURCE, e.to_string()),
    }
}
