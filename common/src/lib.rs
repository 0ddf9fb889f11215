//! Shared job listing records.
//!
//! Used by the scraper (which produces them) and the server (which indexes
//! and returns them). Field names follow the JSON shape consumers expect,
//! so `posted_date` travels as `postedDate` and `job_type` as `jobType`.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

/// Salary placeholder when a listing does not advertise one.
pub const SALARY_NOT_SPECIFIED: &str = "Not specified";

/// Posted-date placeholder when a listing carries no date.
pub const POSTED_RECENTLY: &str = "Recently";

/// Employment type of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum JobType {
    #[default]
    #[serde(rename = "Full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    PartTime,
    #[serde(rename = "Contract")]
    Contract,
    #[serde(rename = "Temporary")]
    Temporary,
}

impl JobType {
    /// Keyword rules in priority order. The first keyword contained in the
    /// lower-cased snippet decides the type.
    pub const RULES: [(&'static str, JobType); 4] = [
        ("full-time", JobType::FullTime),
        ("part-time", JobType::PartTime),
        ("contract", JobType::Contract),
        ("temporary", JobType::Temporary),
    ];

    /// Classifies a free-text snippet such as `"Part-time, Contract"`.
    ///
    /// Falls back to [`JobType::FullTime`] when there is no snippet or no
    /// keyword matches. This is a heuristic: `"not a contract role"` still
    /// reads as a contract.
    pub fn classify(snippet: Option<&str>) -> JobType {
        let Some(snippet) = snippet else {
            return JobType::default();
        };
        let lowered = snippet.to_lowercase();

        Self::RULES
            .iter()
            .find(|(keyword, _)| lowered.contains(keyword))
            .map(|(_, job_type)| *job_type)
            .unwrap_or_default()
    }

    pub fn label(&self) -> &'static str {
        match self {
            JobType::FullTime => "Full-time",
            JobType::PartTime => "Part-time",
            JobType::Contract => "Contract",
            JobType::Temporary => "Temporary",
        }
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One extracted job listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: String,
    pub posted_date: String,
    pub description: String,
    /// Absolute URL of the listing, or empty when the card had no link.
    pub url: String,
    pub job_type: JobType,
    /// Identifier of the site the listing came from, e.g. `"indeed"`.
    pub source: String,
}

impl JobPosting {
    /// Starts a posting from its two required fields.
    ///
    /// Returns `None` when either `title` or `company` is empty after
    /// trimming. Every other field starts at its default.
    pub fn new(title: &str, company: &str, source: &str) -> Option<Self> {
        let title = title.trim();
        let company = company.trim();
        if title.is_empty() || company.is_empty() {
            return None;
        }

        Some(Self {
            title: title.to_string(),
            company: company.to_string(),
            location: String::new(),
            salary: SALARY_NOT_SPECIFIED.to_string(),
            posted_date: POSTED_RECENTLY.to_string(),
            description: String::new(),
            url: String::new(),
            job_type: JobType::default(),
            source: source.to_string(),
        })
    }

    /// Identity used when merging listings from several sites: the URL, or
    /// title, company and location when the card had no link.
    pub fn identity(&self) -> String {
        if self.url.is_empty() {
            format!("{}-{}-{}", self.title, self.company, self.location)
        } else {
            self.url.clone()
        }
    }
}

/// Input of one scrape run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeRequest {
    pub query: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<u32>,
}

impl ScrapeRequest {
    pub const DEFAULT_MAX_PAGES: u32 = 3;

    pub fn new(query: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            location: location.into(),
            max_pages: None,
        }
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// Number of pages to walk, with the default applied. May be zero if the
    /// caller asked for it; the scraper rejects that.
    pub fn pages(&self) -> u32 {
        self.max_pages.unwrap_or(Self::DEFAULT_MAX_PAGES)
    }
}

/// Outcome of one scrape run.
///
/// Only constructible through [`ScrapeResult::succeeded`] and
/// [`ScrapeResult::failed`], so `count` always equals the number of jobs and
/// `error` is present exactly when `success` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapeResult {
    jobs: Vec<JobPosting>,
    success: bool,
    source: String,
    count: usize,
    error: Option<String>,
}

impl ScrapeResult {
    pub fn succeeded(source: impl Into<String>, jobs: Vec<JobPosting>) -> Self {
        Self {
            count: jobs.len(),
            jobs,
            success: true,
            source: source.into(),
            error: None,
        }
    }

    pub fn failed(source: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            jobs: Vec::new(),
            success: false,
            source: source.into(),
            count: 0,
            error: Some(error.into()),
        }
    }

    pub fn jobs(&self) -> &[JobPosting] {
        &self.jobs
    }

    pub fn into_jobs(self) -> Vec<JobPosting> {
        self.jobs
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Merged outcome of scraping several sites for the same request.
///
/// Built by [`AggregateResult::merge`]. Each site keeps its all-or-nothing
/// rule: a failed site adds an entry to `errors` and nothing to `jobs`, while
/// the other sites still contribute. `success` is true when at least one site
/// succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    jobs: Vec<JobPosting>,
    success: bool,
    count: usize,
    total_count: usize,
    duplicates_removed: usize,
    source_counts: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

impl AggregateResult {
    /// Concatenates the jobs of the successful results in the given order
    /// and keeps the first listing of each [`JobPosting::identity`].
    pub fn merge(results: impl IntoIterator<Item = ScrapeResult>) -> Self {
        let mut all_jobs = Vec::new();
        let mut source_counts = BTreeMap::new();
        let mut errors = Vec::new();
        let mut success = false;

        for result in results {
            if result.success {
                success = true;
                source_counts.insert(result.source, result.count);
                all_jobs.extend(result.jobs);
            } else {
                let error = result.error.unwrap_or_default();
                errors.push(format!("{}: {}", result.source, error));
            }
        }

        let total_count = all_jobs.len();
        let mut seen = HashSet::new();
        let jobs: Vec<JobPosting> = all_jobs
            .into_iter()
            .filter(|job| seen.insert(job.identity()))
            .collect();

        Self {
            count: jobs.len(),
            duplicates_removed: total_count - jobs.len(),
            total_count,
            jobs,
            success,
            source_counts,
            errors,
        }
    }

    /// A request refused before any site was contacted.
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            jobs: Vec::new(),
            success: false,
            count: 0,
            total_count: 0,
            duplicates_removed: 0,
            source_counts: BTreeMap::new(),
            errors: vec![error.into()],
        }
    }

    pub fn jobs(&self) -> &[JobPosting] {
        &self.jobs
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Listings found before duplicates were removed.
    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn duplicates_removed(&self) -> usize {
        self.duplicates_removed
    }

    pub fn source_counts(&self) -> &BTreeMap<String, usize> {
        &self.source_counts
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}
