use common::ScrapeRequest;
use url::Url;

use super::{normalize_origin, Field, FieldRule, Read, SiteAdapter};

/// Listings per results page; the `start` parameter moves in these steps.
const PAGE_SIZE: u32 = 10;

const CANDIDATES: &[&str] = &[
    "div.job_seen_beacon",
    "div.jobsearch-SerpJobCard",
    "div[data-jk]",
    "div.slider_container div.slider_item",
    "table.jobsTable tr",
    "article",
];

const PROBES: &[&str] = &[
    "div.job_seen_beacon",
    "div.jobsearch-SerpJobCard",
    "div[data-jk]",
    "article",
    "div[class*=\"job\"]",
];

const RULES: &[FieldRule] = &[
    FieldRule {
        field: Field::Title,
        selectors: &[
            "h2.jobTitle a",
            "h2.jobTitle span",
            "a[data-jk] span[title]",
            "h2 a span[title]",
            ".jobTitle a",
        ],
        read: Read::TextOrAttr("title"),
    },
    FieldRule::text(
        Field::Company,
        &[
            "span[data-testid=\"company-name\"]",
            "span.companyName",
            "a[data-testid=\"company-name\"]",
            ".companyName a",
        ],
    ),
    FieldRule::text(
        Field::Location,
        &[
            "div[data-testid=\"text-location\"]",
            "div.companyLocation",
            ".companyLocation",
        ],
    ),
    FieldRule::text(
        Field::Salary,
        &[
            "div.salary-snippet",
            "div[data-testid=\"attribute_snippet_testid\"]",
            ".salaryText",
            "span.salaryText",
        ],
    ),
    FieldRule::text(
        Field::PostedDate,
        &["span.date", "span[data-testid=\"myJobsStateDate\"]", ".date"],
    ),
    FieldRule::text(
        Field::Description,
        &[
            "div.job-snippet",
            "div[class*=\"snippet\"]",
            ".summary",
            "div.jobsearch-jobDescriptionText",
        ],
    ),
    FieldRule {
        field: Field::Url,
        selectors: &[
            "a[data-jk]",
            "h2.jobTitle a",
            ".jobTitle a",
            "a[href*=\"/viewjob\"]",
        ],
        read: Read::Attr("href"),
    },
    FieldRule::text(
        Field::JobType,
        &[
            "div[data-testid=\"attribute_snippet_testid\"]",
            "div.metadata",
            ".jobTypeLabel",
        ],
    ),
];

/// South African Indeed (`za.indeed.com`).
#[derive(Debug, Clone)]
pub struct IndeedSite {
    origin: String,
}

impl IndeedSite {
    pub const SOURCE: &'static str = "indeed";
    pub const ORIGIN: &'static str = "https://za.indeed.com";

    pub fn new() -> Self {
        Self::with_origin(Self::ORIGIN)
    }

    pub fn with_origin(origin: &str) -> Self {
        Self {
            origin: normalize_origin(origin),
        }
    }
}

impl Default for IndeedSite {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteAdapter for IndeedSite {
    fn source(&self) -> &str {
        Self::SOURCE
    }

    fn origin(&self) -> &str {
        &self.origin
    }

    fn search_url(&self, request: &ScrapeRequest, page: u32) -> Result<Url, url::ParseError> {
        let start = (page * PAGE_SIZE).to_string();
        Url::parse_with_params(
            &format!("{}/jobs", self.origin),
            [
                ("q", request.query.as_str()),
                ("l", request.location.as_str()),
                ("start", start.as_str()),
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
