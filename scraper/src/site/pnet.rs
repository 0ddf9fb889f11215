use common::ScrapeRequest;
use url::Url;

use super::{normalize_origin, Field, FieldRule, Read, SiteAdapter};

const CANDIDATES: &[&str] = &["article.job-result", "div.job-item", "div[data-job-id]"];

const PROBES: &[&str] = &[
    "article.job-result",
    "div.job-item",
    "div[data-job-id]",
    "div.listing",
    "div[class*=\"job\"]",
    "a[href*=\"/jobs/\"]",
];

const RULES: &[FieldRule] = &[
    FieldRule::text(Field::Title, &["h2 a", "h3 a", "a.job-title", ".title a"]),
    FieldRule::text(
        Field::Company,
        &[".company", ".company-name", "span[itemprop=\"name\"]"],
    ),
    FieldRule::text(
        Field::Location,
        &[".location", ".job-location", "span[itemprop=\"addressLocality\"]"],
    ),
    FieldRule::text(Field::Salary, &[".salary", ".job-salary", ".salary-range"]),
    FieldRule {
        field: Field::PostedDate,
        selectors: &[".date", ".posted-date", "time"],
        read: Read::TextOrAttr("datetime"),
    },
    FieldRule::text(
        Field::Description,
        &[".description", ".job-description", ".snippet"],
    ),
    FieldRule {
        field: Field::Url,
        selectors: &["a.job-title", "h2 a", "h3 a", "a[href*=\"/job/\"]"],
        read: Read::Attr("href"),
    },
    FieldRule::text(Field::JobType, &[".job-type", ".employment-type"]),
];

/// PNet (`www.pnet.co.za`). Pages are numbered from one.
#[derive(Debug, Clone)]
pub struct PnetSite {
    origin: String,
}

impl PnetSite {
    pub const SOURCE: &'static str = "pnet";
    pub const ORIGIN: &'static str = "https://www.pnet.co.za";

    pub fn new() -> Self {
        Self::with_origin(Self::ORIGIN)
    }

    pub fn with_origin(origin: &str) -> Self {
        Self {
            origin: normalize_origin(origin),
        }
    }
}

impl Default for PnetSite {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteAdapter for PnetSite {
    fn source(&self) -> &str {
        Self::SOURCE
    }

    fn origin(&self) -> &str {
        &self.origin
    }

    fn search_url(&self, request: &ScrapeRequest, page: u32) -> Result<Url, url::ParseError> {
        let page_number = (page + 1).to_string();
        Url::parse_with_params(
            &format!("{}/jobs/search-results.html", self.origin),
            [
                ("s", request.query.as_str()),
                ("l", request.location.as_str()),
                ("p", page_number.as_str()),
            ],
        )
    }

    fn candidate_selectors(&self) -> &[&'static str] {
        CANDIDATES
    }

    fn field_rules(&self) -> &[FieldRule] {
        RULES
    }

    fn probe_selectors(&self) -> &[&'static str] {
        PROBES
    }
}
