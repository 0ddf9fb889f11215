//! Sequential, paced page fetching.

use std::time::{Duration, Instant};

use common::{JobPosting, ScrapeRequest, ScrapeResult};
use reqwest::blocking::Client;
use reqwest::header::{self, HeaderMap, HeaderValue};
use scraper::Html;
use tracing::{debug, error, info, info_span};
use url::Url;

use crate::config::{Settings, DEFAULT_USER_AGENT};
use crate::error::ScrapeError;
use crate::extract::Extractor;
use crate::pacing::{Pacing, Pause, ThreadSleep};
use crate::site::{Site, SiteAdapter};

/// Fetches the HTML body behind a URL.
pub trait PageSource: Send {
    fn fetch(&self, url: &Url) -> Result<String, ScrapeError>;
}

/// Blocking HTTP source that looks like a desktop browser.
///
/// One client, and so one connection pool, is reused for every page. The
/// `gzip`/`deflate` features make reqwest send `Accept-Encoding: gzip,
/// deflate` and decode the body.
pub struct HttpPageSource {
    client: Client,
}

impl HttpPageSource {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .default_headers(browser_headers())
            .user_agent(user_agent.to_string())
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.5"),
    );
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );
    headers
}

impl PageSource for HttpPageSource {
    fn fetch(&self, url: &Url) -> Result<String, ScrapeError> {
        let timed_out = |e: reqwest::Error| {
            if e.is_timeout() {
                ScrapeError::Timeout {
                    url: url.to_string(),
                }
            } else {
                ScrapeError::Http(e)
            }
        };

        let response = self.client.get(url.clone()).send().map_err(timed_out)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().map_err(timed_out)
    }
}

/// Walks the result pages of one site and collects its postings.
pub struct Scraper {
    site: Box<dyn SiteAdapter>,
    extractor: Extractor,
    pages: Box<dyn PageSource>,
    pacing: Pacing,
    pause: Box<dyn Pause>,
}

impl Scraper {
    pub fn new(
        site: Box<dyn SiteAdapter>,
        pages: Box<dyn PageSource>,
    ) -> Result<Self, ScrapeError> {
        let extractor = Extractor::for_site(site.as_ref())?;
        Ok(Self {
            site,
            extractor,
            pages,
            pacing: Pacing::default(),
            pause: Box::new(ThreadSleep),
        })
    }

    /// Scraper for the configured site over HTTP.
    pub fn from_settings(settings: &Settings) -> Result<Self, ScrapeError> {
        Self::for_site(settings, settings.site.kind)
    }

    /// Scraper for `site` over HTTP, using the configured client, pacing
    /// and origin overrides.
    pub fn for_site(settings: &Settings, site: Site) -> Result<Self, ScrapeError> {
        let site = site.adapter(settings.site.origin_for(site));
        let pages = HttpPageSource::new(&settings.http.user_agent, settings.http.timeout())?;
        Ok(Self::new(site, Box::new(pages))?.with_pacing(settings.pacing.pacing()))
    }

    /// Indeed over HTTP with the default browser profile and pacing.
    pub fn indeed() -> Result<Self, ScrapeError> {
        let pages = HttpPageSource::new(DEFAULT_USER_AGENT, Duration::from_secs(60))?;
        Self::new(Box::new(crate::site::IndeedSite::new()), Box::new(pages))
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_pause(mut self, pause: Box<dyn Pause>) -> Self {
        self.pause = pause;
        self
    }

    pub fn source(&self) -> &str {
        self.site.source()
    }

    /// Runs one scrape. Never fails: any page-level error yields an empty,
    /// unsuccessful result and discards the pages fetched before it.
    pub fn scrape(&self, request: &ScrapeRequest) -> ScrapeResult {
        let span = info_span!(
            "scrape",
            source = self.source(),
            query = %request.query,
            location = %request.location
        );
        let _enter = span.enter();
        let started = Instant::now();

        match self.collect(request) {
            Ok(jobs) => {
                info!(
                    count = jobs.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "scrape completed"
                );
                ScrapeResult::succeeded(self.source(), jobs)
            }
            Err(e) => {
                error!(error = %e, "scrape failed");
                ScrapeResult::failed(self.source(), e.to_string())
            }
        }
    }

    fn collect(&self, request: &ScrapeRequest) -> Result<Vec<JobPosting>, ScrapeError> {
        let max_pages = request.pages();
        if max_pages == 0 {
            return Err(ScrapeError::InvalidRequest(
                "maxPages must be at least 1".to_string(),
            ));
        }

        let mut rng = rand::rng();
        let mut all_jobs = Vec::new();

        for page in 0..max_pages {
            let url = self.site.search_url(request, page)?;
            info!(page = page + 1, max_pages, %url, "fetching page");

            let fetch_started = Instant::now();
            let body = self.pages.fetch(&url)?;
            debug!(
                page = page + 1,
                bytes = body.len(),
                elapsed_ms = fetch_started.elapsed().as_millis() as u64,
                "page loaded"
            );

            self.pause.pause(self.pacing.page_load.sample(&mut rng));

            let document = Html::parse_document(&body);
            let probes = self.extractor.probe_counts(&document);
            debug!(page = page + 1, ?probes, "selector probes");

            let jobs = self.extractor.extract(&document);
            info!(page = page + 1, found = jobs.len(), "page extracted");
            all_jobs.extend(jobs);

            if page + 1 < max_pages {
                self.pause.pause(self.pacing.between_pages.sample(&mut rng));
            }
        }

        Ok(all_jobs)
    }
}
