//! In-memory full-text index over scraped job postings.

use common::JobPosting;
use regex::Regex;
use serde::Serialize;
use tantivy::{
    Document, Index, IndexReader, ReloadPolicy,
    collector::TopDocs,
    query::{AllQuery, BooleanQuery, Occur, Query, QueryParser, RangeQuery},
    schema::{Field, INDEXED, STORED, STRING, Schema, TEXT},
};

/// Extracts the lowest amount from a free-text salary such as
/// `"R25,000 - R35,000 a month"`. Amounts below 1000 are ignored since they
/// are usually hours or days rather than pay.
pub fn salary_floor(salary: &str) -> Option<i64> {
    // Thousands may be separated by commas or spaces ("R25 000")
    let re = Regex::new(r"(?:R|\$)?\s?(\d{1,3}(?:[, ]\d{3})+|\d+)").ok()?;

    re.captures_iter(salary)
        .filter_map(|cap| cap.get(1))
        .filter_map(|matched| {
            let digits: String = matched
                .as_str()
                .chars()
                .filter(|c| c.is_ascii_digit())
                .collect();
            digits.parse::<i64>().ok()
        })
        .find(|amount| *amount >= 1000)
}

/// One search hit returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: String,
    pub url: String,
    pub job_type: String,
    pub source: String,
    pub score: f32,
}

struct JobFields {
    title: Field,
    company: Field,
    location: Field,
    description: Field,
    salary: Field,
    salary_min: Field,
    url: Field,
    job_type: Field,
    source: Field,
}

impl JobFields {
    fn schema() -> (Schema, Self) {
        let mut builder = Schema::builder();

        let fields = Self {
            // Searchable and returned in results
            title: builder.add_text_field("title", TEXT | STORED),
            company: builder.add_text_field("company", TEXT | STORED),
            location: builder.add_text_field("location", TEXT | STORED),
            // Searchable only
            description: builder.add_text_field("description", TEXT),
            // Returned only
            salary: builder.add_text_field("salary", STORED),
            url: builder.add_text_field("url", STORED),
            job_type: builder.add_text_field("job_type", STRING | STORED),
            source: builder.add_text_field("source", STRING | STORED),
            // Range-filterable
            salary_min: builder.add_i64_field("salary_min", INDEXED | STORED),
        };

        (builder.build(), fields)
    }

    fn document(&self, job: &JobPosting) -> Document {
        let mut doc = Document::new();
        doc.add_text(self.title, &job.title);
        doc.add_text(self.company, &job.company);
        doc.add_text(self.location, &job.location);
        doc.add_text(self.description, &job.description);
        doc.add_text(self.salary, &job.salary);
        doc.add_text(self.url, &job.url);
        doc.add_text(self.job_type, job.job_type.label());
        doc.add_text(self.source, &job.source);
        if let Some(floor) = salary_floor(&job.salary) {
            doc.add_i64(self.salary_min, floor);
        }
        doc
    }

    fn text(&self, doc: &Document, field: Field) -> String {
        doc.get_first(field)
            .and_then(|value| value.as_text())
            .unwrap_or_default()
            .to_string()
    }
}

/// Index over one batch of postings. Rebuilt wholesale on every scrape.
pub struct JobIndex {
    reader: IndexReader,
    query_parser: QueryParser,
    fields: JobFields,
    len: usize,
}

impl JobIndex {
    pub fn build(jobs: &[JobPosting]) -> anyhow::Result<Self> {
        let (schema, fields) = JobFields::schema();
        let index = Index::create_in_ram(schema);

        // 50MB heap is plenty for a few pages of listings
        let mut writer = index.writer(50_000_000)?;
        for job in jobs {
            writer.add_document(fields.document(job))?;
        }
        writer.commit()?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        let query_parser = QueryParser::for_index(
            &index,
            vec![
                fields.title,
                fields.company,
                fields.location,
                fields.description,
            ],
        );

        Ok(Self {
            reader,
            query_parser,
            fields,
            len: jobs.len(),
        })
    }

    pub fn empty() -> anyhow::Result<Self> {
        Self::build(&[])
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Keyword search, optionally limited to postings whose salary floor is
    /// at least `min_salary`. An empty `keywords` matches everything.
    pub fn search(
        &self,
        keywords: &str,
        min_salary: Option<i64>,
        limit: usize,
    ) -> anyhow::Result<Vec<SearchHit>> {
        let text_query: Box<dyn Query> = if keywords.trim().is_empty() {
            Box::new(AllQuery)
        } else {
            self.query_parser.parse_query(keywords)?
        };

        let query: Box<dyn Query> = match min_salary {
            Some(min) => Box::new(BooleanQuery::new(vec![
                (Occur::Must, text_query),
                (
                    Occur::Must,
                    Box::new(RangeQuery::new_i64(self.fields.salary_min, min..i64::MAX)),
                ),
            ])),
            None => text_query,
        };

        let searcher = self.reader.searcher();
        let top_docs = searcher.search(query.as_ref(), &TopDocs::with_limit(limit))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc = searcher.doc(address)?;
            hits.push(SearchHit {
                title: self.fields.text(&doc, self.fields.title),
                company: self.fields.text(&doc, self.fields.company),
                location: self.fields.text(&doc, self.fields.location),
                salary: self.fields.text(&doc, self.fields.salary),
                url: self.fields.text(&doc, self.fields.url),
                job_type: self.fields.text(&doc, self.fields.job_type),
                source: self.fields.text(&doc, self.fields.source),
                score,
            });
        }

        Ok(hits)
    }
}
