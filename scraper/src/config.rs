use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::pacing::{DelayRange, Pacing};
use crate::site::Site;

/// Scraper configuration.
///
/// Layered as: built-in defaults, `config/default.toml`,
/// `config/{APP_ENVIRONMENT}.toml`, then `JOB_SCRAPER__*` environment
/// variables (e.g. `JOB_SCRAPER__SEARCH__QUERY=rust`).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub site: SiteSettings,
    pub http: HttpSettings,
    pub pacing: PacingSettings,
    pub search: SearchSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteSettings {
    pub kind: Site,
    /// Replaces the site's built-in origin, e.g. for a regional mirror.
    pub origin: Option<String>,
    /// Origin overrides for other sites, keyed by site (`site.origins.pnet`).
    #[serde(default)]
    pub origins: HashMap<Site, String>,
}

impl SiteSettings {
    /// Origin override for `site`, if any. `origin` applies to `kind` only.
    pub fn origin_for(&self, site: Site) -> Option<&str> {
        self.origins
            .get(&site)
            .or(self.origin.as_ref().filter(|_| site == self.kind))
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Millisecond bounds of the randomized pauses.
#[derive(Debug, Clone, Deserialize)]
pub struct PacingSettings {
    pub page_load_min_ms: u64,
    pub page_load_max_ms: u64,
    pub between_pages_min_ms: u64,
    pub between_pages_max_ms: u64,
}

impl PacingSettings {
    pub fn pacing(&self) -> Pacing {
        Pacing {
            page_load: DelayRange::new(self.page_load_min_ms, self.page_load_max_ms),
            between_pages: DelayRange::new(self.between_pages_min_ms, self.between_pages_max_ms),
        }
    }
}

/// Search used by the `job-scraper` binary.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    pub query: String,
    pub location: String,
    pub max_pages: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

impl Settings {
    /// Loads settings from files and the environment on top of the defaults.
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        Self::with_defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("JOB_SCRAPER").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Built-in defaults only, ignoring files and the environment.
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::with_defaults()?.build()?.try_deserialize()
    }

    fn with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("site.kind", "indeed")?
            .set_default("http.timeout_secs", 60)?
            .set_default("http.user_agent", DEFAULT_USER_AGENT)?
            .set_default("pacing.page_load_min_ms", 1000)?
            .set_default("pacing.page_load_max_ms", 2000)?
            .set_default("pacing.between_pages_min_ms", 1500)?
            .set_default("pacing.between_pages_max_ms", 3000)?
            .set_default("search.query", "Python Developer")?
            .set_default("search.location", "Cape Town")?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)
    }
}
