//! Per-site scraping knowledge: where to search and how a listing card is laid out.

use common::ScrapeRequest;
use serde::Deserialize;
use url::Url;

mod indeed;
mod pnet;

pub use indeed::IndeedSite;
pub use pnet::PnetSite;

/// A field of [`common::JobPosting`] that is read from the card markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Company,
    Location,
    Salary,
    PostedDate,
    Description,
    Url,
    JobType,
}

/// How a matched element turns into a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Read {
    /// Trimmed text content.
    Text,
    /// Trimmed text content, or the named attribute when the text is empty.
    TextOrAttr(&'static str),
    /// The named attribute only.
    Attr(&'static str),
}

/// Ordered selector cascade for one field. The first selector whose element
/// reads as non-empty wins.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: Field,
    pub selectors: &'static [&'static str],
    pub read: Read,
}

impl FieldRule {
    pub const fn text(field: Field, selectors: &'static [&'static str]) -> Self {
        Self {
            field,
            selectors,
            read: Read::Text,
        }
    }
}

/// Everything the paginator and extractor need to know about one job board.
pub trait SiteAdapter: Send + Sync {
    /// Identifier stamped on every posting and result, e.g. `"indeed"`.
    fn source(&self) -> &str;

    /// Scheme, host and optional path prefix that relative hrefs are appended
    /// to, without a trailing slash.
    fn origin(&self) -> &str;

    /// Search URL for the zero-based `page` of `request`.
    fn search_url(&self, request: &ScrapeRequest, page: u32) -> Result<Url, url::ParseError>;

    /// Selectors whose union yields the listing cards of a page.
    fn candidate_selectors(&self) -> &[&'static str];

    fn field_rules(&self) -> &[FieldRule];

    /// Selectors whose match counts are logged per page to spot markup drift.
    fn probe_selectors(&self) -> &[&'static str] {
        &[]
    }
}

/// Built-in sites, selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Site {
    Indeed,
    Pnet,
}

impl Site {
    pub fn source(&self) -> &'static str {
        match self {
            Site::Indeed => IndeedSite::SOURCE,
            Site::Pnet => PnetSite::SOURCE,
        }
    }

    pub fn adapter(&self, origin: Option<&str>) -> Box<dyn SiteAdapter> {
        match (self, origin) {
            (Site::Indeed, None) => Box::new(IndeedSite::new()),
            (Site::Indeed, Some(origin)) => Box::new(IndeedSite::with_origin(origin)),
            (Site::Pnet, None) => Box::new(PnetSite::new()),
            (Site::Pnet, Some(origin)) => Box::new(PnetSite::with_origin(origin)),
        }
    }
}

pub(crate) fn normalize_origin(origin: &str) -> String {
    origin.trim_end_matches('/').to_string()
}
