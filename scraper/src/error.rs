use thiserror::Error;

/// Page-level failure. Any of these aborts the whole scrape.
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("could not build search URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("invalid site origin `{origin}`: {source}")]
    InvalidOrigin {
        origin: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

/// Failure extracting a single listing card. Never escapes the extractor.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("malformed listing URL `{href}`: {source}")]
    MalformedUrl {
        href: String,
        #[source]
        source: url::ParseError,
    },
}
