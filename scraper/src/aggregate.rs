//! Scrapes several sites for the same request and merges their listings.

use common::{AggregateResult, ScrapeRequest, ScrapeResult};
use tracing::{info, info_span};

use crate::config::Settings;
use crate::fetch::Scraper;
use crate::site::Site;

/// Runs one scraper per site, one after another, and merges the results.
///
/// Sites are visited in the given order with repeats ignored; an empty list
/// means the configured site. A site that fails, including one whose scraper
/// cannot be built, only adds an entry to the merged `errors`.
pub fn scrape_sources(
    settings: &Settings,
    sources: &[Site],
    request: &ScrapeRequest,
) -> AggregateResult {
    let mut sites: Vec<Site> = Vec::with_capacity(sources.len().max(1));
    for site in sources {
        if !sites.contains(site) {
            sites.push(*site);
        }
    }
    if sites.is_empty() {
        sites.push(settings.site.kind);
    }

    let span = info_span!("scrape_sources", sites = sites.len());
    let _enter = span.enter();

    let results: Vec<ScrapeResult> = sites
        .iter()
        .map(|site| match Scraper::for_site(settings, *site) {
            Ok(scraper) => scraper.scrape(request),
            Err(e) => ScrapeResult::failed(site.source(), e.to_string()),
        })
        .collect();

    let merged = AggregateResult::merge(results);
    info!(
        unique = merged.count(),
        total = merged.total_count(),
        duplicates_removed = merged.duplicates_removed(),
        failed_sites = merged.errors().len(),
        "sources merged"
    );
    merged
}
