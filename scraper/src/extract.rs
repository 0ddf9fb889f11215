//! Maps one results page to job postings.
//!
//! Listing cards are the union of the site's candidate selectors, in
//! document order. Each field of a card is read through its own selector
//! cascade so a card missing, say, a salary still yields a posting. A card
//! that fails outright is logged and skipped; it never costs the rest of the
//! page.

use common::{JobPosting, JobType};
use scraper::{ElementRef, Html, Selector};
use tracing::{trace, warn};
use url::Url;

use crate::error::{ExtractError, ScrapeError};
use crate::site::{Field, Read, SiteAdapter};

struct CompiledRule {
    field: Field,
    selectors: Vec<Selector>,
    read: Read,
}

/// Selectors of one site, compiled once and reused for every page.
pub struct Extractor {
    source: String,
    origin: String,
    candidates: Selector,
    rules: Vec<CompiledRule>,
    probes: Vec<(&'static str, Selector)>,
}

fn compile(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector).map_err(|e| ScrapeError::Selector {
        selector: selector.to_string(),
        reason: format!("{:?}", e),
    })
}

impl Extractor {
    pub fn for_site(site: &dyn SiteAdapter) -> Result<Self, ScrapeError> {
        let candidates = compile(&site.candidate_selectors().join(", "))?;

        let rules = site
            .field_rules()
            .iter()
            .map(|rule| {
                let selectors = rule
                    .selectors
                    .iter()
                    .map(|selector| compile(selector))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(CompiledRule {
                    field: rule.field,
                    selectors,
                    read: rule.read,
                })
            })
            .collect::<Result<Vec<_>, ScrapeError>>()?;

        let probes = site
            .probe_selectors()
            .iter()
            .map(|probe| Ok((*probe, compile(probe)?)))
            .collect::<Result<Vec<_>, ScrapeError>>()?;

        let origin = site.origin().to_string();
        Url::parse(&origin).map_err(|source| ScrapeError::InvalidOrigin {
            origin: origin.clone(),
            source,
        })?;

        Ok(Self {
            source: site.source().to_string(),
            origin,
            candidates,
            rules,
            probes,
        })
    }

    /// Extracts every well-formed posting of `document`, in document order.
    pub fn extract(&self, document: &Html) -> Vec<JobPosting> {
        let mut jobs = Vec::new();

        for (index, card) in document.select(&self.candidates).enumerate() {
            match self.extract_card(card) {
                Ok(Some(job)) => jobs.push(job),
                Ok(None) => trace!(index, "card has no title or company"),
                Err(error) => warn!(index, %error, "skipping malformed listing"),
            }
        }

        jobs
    }

    /// Match counts of the site's probe selectors, for diagnostics.
    pub fn probe_counts(&self, document: &Html) -> Vec<(&'static str, usize)> {
        self.probes
            .iter()
            .map(|(name, selector)| (*name, document.select(selector).count()))
            .collect()
    }

    /// Reads one card. `Ok(None)` means the card lacks a title or company.
    pub fn extract_card(&self, card: ElementRef<'_>) -> Result<Option<JobPosting>, ExtractError> {
        let title = self.read_field(card, Field::Title).unwrap_or_default();
        let company = self.read_field(card, Field::Company).unwrap_or_default();
        let Some(mut job) = JobPosting::new(&title, &company, &self.source) else {
            return Ok(None);
        };

        if let Some(location) = self.read_field(card, Field::Location) {
            job.location = location;
        }
        if let Some(salary) = self.read_field(card, Field::Salary) {
            job.salary = salary;
        }
        if let Some(posted_date) = self.read_field(card, Field::PostedDate) {
            job.posted_date = posted_date;
        }
        if let Some(description) = self.read_field(card, Field::Description) {
            job.description = description;
        }
        if let Some(href) = self.read_field(card, Field::Url) {
            job.url = resolve_url(&self.origin, &href)?;
        }
        job.job_type = JobType::classify(self.read_field(card, Field::JobType).as_deref());

        Ok(Some(job))
    }

    fn read_field(&self, card: ElementRef<'_>, field: Field) -> Option<String> {
        let rule = self.rules.iter().find(|rule| rule.field == field)?;

        rule.selectors.iter().find_map(|selector| {
            card.select(selector)
                .find_map(|element| read_value(element, rule.read))
        })
    }
}

fn read_value(element: ElementRef<'_>, read: Read) -> Option<String> {
    let value = match read {
        Read::Text => text_of(element),
        Read::TextOrAttr(name) => {
            let text = text_of(element);
            if text.is_empty() {
                attr_of(element, name)
            } else {
                text
            }
        }
        Read::Attr(name) => attr_of(element, name),
    };

    (!value.is_empty()).then_some(value)
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn attr_of(element: ElementRef<'_>, name: &str) -> String {
    element
        .value()
        .attr(name)
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}

/// Makes `href` absolute against `origin`, which carries no trailing slash.
///
/// Hrefs starting with `http` are returned unchanged. Anything else is
/// appended to the origin as written, with a `/` in between when the href
/// lacks one. Either way the result has to parse as a URL.
pub fn resolve_url(origin: &str, href: &str) -> Result<String, ExtractError> {
    let absolute = if href.starts_with("http") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{origin}{href}")
    } else {
        format!("{origin}/{href}")
    };

    Url::parse(&absolute).map_err(|source| ExtractError::MalformedUrl {
        href: href.to_string(),
        source,
    })?;

    Ok(absolute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::{IndeedSite, PnetSite};

    fn indeed() -> Extractor {
        Extractor::for_site(&IndeedSite::new()).unwrap()
    }

    fn page(cards: &[String]) -> Html {
        Html::parse_document(&format!(
            "<html><body><div id=\"mosaic\">{}</div></body></html>",
            cards.concat()
        ))
    }

    fn card(title: &str, company: &str, href: &str) -> String {
        format!(
            r#"<div class="job_seen_beacon">
                <h2 class="jobTitle"><a href="{href}"><span>{title}</span></a></h2>
                <span data-testid="company-name">{company}</span>
            </div>"#
        )
    }

    #[test]
    fn test_full_card() {
        let html = page(&[r#"
            <div class="job_seen_beacon">
                <h2 class="jobTitle"><a href="/viewjob?jk=abc"><span> Senior Rust Engineer </span></a></h2>
                <span data-testid="company-name">Acme Corp</span>
                <div data-testid="text-location">Cape Town, Western Cape</div>
                <div class="salary-snippet">R60,000 - R80,000 a month</div>
                <span class="date">Posted 3 days ago</span>
                <div class="job-snippet"><ul><li>Build crawlers</li></ul></div>
                <div class="metadata">Contract</div>
            </div>"#
            .to_string()]);

        let jobs = indeed().extract(&html);
        assert_eq!(jobs.len(), 1);

        let job = &jobs[0];
        assert_eq!(job.title, "Senior Rust Engineer");
        assert_eq!(job.company, "Acme Corp");
        assert_eq!(job.location, "Cape Town, Western Cape");
        assert_eq!(job.salary, "R60,000 - R80,000 a month");
        assert_eq!(job.posted_date, "Posted 3 days ago");
        assert_eq!(job.description, "Build crawlers");
        assert_eq!(job.url, "https://za.indeed.com/viewjob?jk=abc");
        assert_eq!(job.job_type, JobType::Contract);
        assert_eq!(job.source, "indeed");
    }

    #[test]
    fn test_missing_optional_fields_use_defaults() {
        let html = page(&[card("Data Analyst", "Globex", "/viewjob?jk=1")]);

        let jobs = indeed().extract(&html);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].location, "");
        assert_eq!(jobs[0].salary, "Not specified");
        assert_eq!(jobs[0].posted_date, "Recently");
        assert_eq!(jobs[0].description, "");
        assert_eq!(jobs[0].job_type, JobType::FullTime);
    }

    #[test]
    fn test_cards_without_title_or_company_are_dropped() {
        let html = page(&[
            card("Backend Developer", "Initech", "/viewjob?jk=1"),
            card("Frontend Developer", "   ", "/viewjob?jk=2"),
            card("", "Hooli", "/viewjob?jk=3"),
            card("QA Engineer", "Umbrella", "/viewjob?jk=4"),
        ]);

        let jobs = indeed().extract(&html);
        let titles: Vec<_> = jobs.iter().map(|job| job.title.as_str()).collect();
        assert_eq!(titles, ["Backend Developer", "QA Engineer"]);
    }

    #[test]
    fn test_malformed_card_does_not_abort_page() {
        let html = page(&[
            card("Backend Developer", "Initech", "/viewjob?jk=1"),
            card("Broken Listing", "Nowhere", "http://[oops/viewjob?jk=2"),
            card("QA Engineer", "Umbrella", "/viewjob?jk=3"),
            card("DevOps Engineer", "Vandelay", "https://example.com/jobs/4"),
        ]);

        let jobs = indeed().extract(&html);
        let titles: Vec<_> = jobs.iter().map(|job| job.title.as_str()).collect();
        assert_eq!(titles, ["Backend Developer", "QA Engineer", "DevOps Engineer"]);
    }

    #[test]
    fn test_title_falls_back_to_title_attribute() {
        let html = page(&[r#"
            <div class="job_seen_beacon">
                <h2><a href="/viewjob?jk=9"><span title="Platform Engineer"></span></a></h2>
                <span class="companyName">Stark Industries</span>
            </div>"#
            .to_string()]);

        let jobs = indeed().extract(&html);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title, "Platform Engineer");
        assert_eq!(jobs[0].company, "Stark Industries");
    }

    #[test]
    fn test_cascade_skips_selectors_with_empty_text() {
        let html = page(&[r#"
            <div class="job_seen_beacon">
                <h2 class="jobTitle"><a href="/viewjob?jk=5"><span>SRE</span></a></h2>
                <span data-testid="company-name">  </span>
                <span class="companyName">Wayne Enterprises</span>
            </div>"#
            .to_string()]);

        let jobs = indeed().extract(&html);
        assert_eq!(jobs[0].company, "Wayne Enterprises");
    }

    #[test]
    fn test_job_type_priority() {
        let html = page(&[r#"
            <div class="job_seen_beacon">
                <h2 class="jobTitle"><a href="/viewjob?jk=6">Barista</a></h2>
                <span data-testid="company-name">Central Perk</span>
                <div class="metadata">Part-time Contract</div>
            </div>"#
            .to_string()]);

        let jobs = indeed().extract(&html);
        assert_eq!(jobs[0].job_type, JobType::PartTime);
    }

    #[test]
    fn test_preserves_document_order() {
        let cards: Vec<_> = (1..=5)
            .map(|n| card(&format!("Job {n}"), "Acme", &format!("/viewjob?jk={n}")))
            .collect();

        let jobs = indeed().extract(&page(&cards));
        let titles: Vec<_> = jobs.iter().map(|job| job.title.clone()).collect();
        assert_eq!(titles, ["Job 1", "Job 2", "Job 3", "Job 4", "Job 5"]);
    }

    #[test]
    fn test_resolve_url() {
        let origin = "https://za.indeed.com";

        assert_eq!(
            resolve_url(origin, "/viewjob?jk=123").unwrap(),
            "https://za.indeed.com/viewjob?jk=123"
        );
        assert_eq!(
            resolve_url(origin, "https://example.com/job/1").unwrap(),
            "https://example.com/job/1"
        );
        assert_eq!(
            resolve_url(origin, "rc/clk?jk=7").unwrap(),
            "https://za.indeed.com/rc/clk?jk=7"
        );
        assert!(resolve_url(origin, "http://[oops/viewjob").is_err());
    }

    #[test]
    fn test_resolve_url_never_leaves_the_origin() {
        let origin = "https://za.indeed.com";

        assert_eq!(
            resolve_url(origin, "//evil.example/viewjob?jk=1").unwrap(),
            "https://za.indeed.com//evil.example/viewjob?jk=1"
        );
        assert_eq!(
            resolve_url(origin, "?jk=1").unwrap(),
            "https://za.indeed.com/?jk=1"
        );
    }

    #[test]
    fn test_resolve_url_keeps_origin_path() {
        assert_eq!(
            resolve_url("http://mirror.local/indeed", "/viewjob?jk=1").unwrap(),
            "http://mirror.local/indeed/viewjob?jk=1"
        );

        let extractor =
            Extractor::for_site(&IndeedSite::with_origin("http://mirror.local/indeed/")).unwrap();
        let jobs = extractor.extract(&page(&[card("SRE", "Acme", "/viewjob?jk=2")]));
        assert_eq!(jobs[0].url, "http://mirror.local/indeed/viewjob?jk=2");
    }

    #[test]
    fn test_invalid_origin_is_rejected() {
        let result = Extractor::for_site(&IndeedSite::with_origin("not a url"));

        match result {
            Err(error @ ScrapeError::InvalidOrigin { .. }) => {
                assert!(error.to_string().contains("invalid site origin"));
            }
            _ => panic!("expected an invalid origin error"),
        }
    }

    #[test]
    fn test_card_without_link_has_empty_url() {
        let html = page(&[r#"
            <div class="job_seen_beacon">
                <h2 class="jobTitle"><span>Office Manager</span></h2>
                <span class="companyName">Dunder Mifflin</span>
            </div>"#
            .to_string()]);

        let jobs = indeed().extract(&html);
        assert_eq!(jobs[0].url, "");
    }

    #[test]
    fn test_pnet_cards() {
        let extractor = Extractor::for_site(&PnetSite::new()).unwrap();
        let html = Html::parse_document(
            r#"<html><body>
                <article class="job-result">
                    <h2><a href="/jobs/rust-dev-1">Rust Developer</a></h2>
                    <span class="company">Acme</span>
                    <span class="location">Durban</span>
                    <time datetime="2026-10-01"></time>
                    <span class="employment-type">Temporary</span>
                </article>
            </body></html>"#,
        );

        let jobs = extractor.extract(&html);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].url, "https://www.pnet.co.za/jobs/rust-dev-1");
        assert_eq!(jobs[0].posted_date, "2026-10-01");
        assert_eq!(jobs[0].job_type, JobType::Temporary);
        assert_eq!(jobs[0].source, "pnet");
    }

    #[test]
    fn test_probe_counts() {
        let html = page(&[
            card("A", "B", "/viewjob?jk=1"),
            card("C", "D", "/viewjob?jk=2"),
        ]);

        let counts = indeed().probe_counts(&html);
        assert!(counts.contains(&("div.job_seen_beacon", 2)));
        assert!(counts.contains(&("article", 0)));
    }
}
