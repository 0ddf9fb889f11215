//! REST API: trigger scrapes and search their results.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use common::{AggregateResult, ScrapeRequest, ScrapeResult};
use job_scraper::{Scraper, Settings, Site, scrape_sources};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::index::{JobIndex, SearchHit};

/// Hits returned per search.
const SEARCH_LIMIT: usize = 10;

/// API response for `GET /search`
#[derive(Debug, Serialize)]
struct SearchResponse {
    query: String,
    total_results: usize,
    results: Vec<SearchHit>,
}

/// Query parameters for `GET /search`
#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
    min_salary: Option<i64>,
}

/// Body of `POST /scrape`. With `sources` the listed sites are scraped in
/// turn and merged; without it only the configured site is scraped.
#[derive(Debug, Deserialize)]
struct ScrapeBody {
    #[serde(flatten)]
    request: ScrapeRequest,
    sources: Option<Vec<Site>>,
}

/// Shared application state
pub struct AppState {
    settings: Settings,
    index: RwLock<Arc<JobIndex>>,
}

impl AppState {
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        Ok(Self::with_index(settings, JobIndex::empty()?))
    }

    pub fn with_index(settings: Settings, index: JobIndex) -> Self {
        Self {
            settings,
            index: RwLock::new(Arc::new(index)),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/search", get(search_handler))
        .route("/scrape", post(scrape_handler))
        .with_state(state)
}

/// Handler for GET / (root)
async fn root_handler() -> &'static str {
    "Job Search API\n\nEndpoints:\n  POST /scrape {\"query\", \"location\", \"maxPages\", \"sources\"} - Scrape listings\n  GET /search?q=<keywords>&min_salary=<amount> - Search scraped listings\n\nExample:\n  curl -X POST http://127.0.0.1:3000/scrape -H 'content-type: application/json' -d '{\"query\":\"rust developer\",\"location\":\"Cape Town\",\"maxPages\":1}'"
}

/// Handler for GET /search?q=<keywords>
async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Json<SearchResponse> {
    let query = params.q.unwrap_or_default();

    if query.is_empty() && params.min_salary.is_none() {
        return Json(SearchResponse {
            query,
            total_results: 0,
            results: vec![],
        });
    }

    let index = state.index.read().await.clone();
    let results = match index.search(&query, params.min_salary, SEARCH_LIMIT) {
        Ok(results) => results,
        Err(e) => {
            info!(%query, error = %e, "search query rejected");
            vec![]
        }
    };

    Json(SearchResponse {
        query,
        total_results: results.len(),
        results,
    })
}

/// Handler for POST /scrape
///
/// The scrape itself blocks for seconds per page, so it runs on the blocking
/// pool. A successful scrape replaces the search index.
async fn scrape_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ScrapeBody>,
) -> Response {
    match body.sources {
        Some(sources) => scrape_many(state, sources, body.request)
            .await
            .into_response(),
        None => scrape_one(state, body.request).await.into_response(),
    }
}

async fn scrape_one(
    state: Arc<AppState>,
    request: ScrapeRequest,
) -> (StatusCode, Json<ScrapeResult>) {
    let source = state.settings.site.kind.source();

    if request.pages() == 0 {
        return (
            StatusCode::BAD_REQUEST,
            Json(ScrapeResult::failed(source, "maxPages must be at least 1")),
        );
    }

    let settings = state.settings.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let result = match Scraper::from_settings(&settings) {
            Ok(scraper) => scraper.scrape(&request),
            Err(e) => ScrapeResult::failed(source, e.to_string()),
        };
        let index = result.success().then(|| JobIndex::build(result.jobs()));
        (result, index)
    })
    .await;

    let (result, index) = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "scrape task panicked");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ScrapeResult::failed(source, e.to_string())),
            );
        }
    };

    replace_index(&state, index).await;
    (status_for(result.success()), Json(result))
}

async fn scrape_many(
    state: Arc<AppState>,
    sources: Vec<Site>,
    request: ScrapeRequest,
) -> (StatusCode, Json<AggregateResult>) {
    if request.pages() == 0 {
        return (
            StatusCode::BAD_REQUEST,
            Json(AggregateResult::rejected("maxPages must be at least 1")),
        );
    }

    let settings = state.settings.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let merged = scrape_sources(&settings, &sources, &request);
        let index = merged.success().then(|| JobIndex::build(merged.jobs()));
        (merged, index)
    })
    .await;

    let (merged, index) = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "scrape task panicked");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(AggregateResult::rejected(e.to_string())),
            );
        }
    };

    replace_index(&state, index).await;
    (status_for(merged.success()), Json(merged))
}

async fn replace_index(state: &AppState, index: Option<anyhow::Result<JobIndex>>) {
    match index {
        Some(Ok(index)) => {
            info!(count = index.len(), "search index rebuilt");
            *state.index.write().await = Arc::new(index);
        }
        Some(Err(e)) => error!(error = %e, "failed to index scraped jobs"),
        None => {}
    }
}

fn status_for(success: bool) -> StatusCode {
    if success {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use common::JobPosting;
    use serde_json::Value;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn state_with(jobs: &[JobPosting]) -> Arc<AppState> {
        let settings = Settings::defaults().unwrap();
        Arc::new(AppState::with_index(settings, JobIndex::build(jobs).unwrap()))
    }

    /// Default settings with no pauses and both sites pointed at mock servers.
    fn mock_settings(indeed: &MockServer, pnet: &MockServer) -> Settings {
        let mut settings = Settings::defaults().unwrap();
        settings.pacing.page_load_min_ms = 0;
        settings.pacing.page_load_max_ms = 0;
        settings.pacing.between_pages_min_ms = 0;
        settings.pacing.between_pages_max_ms = 0;
        let origins = &mut settings.site.origins;
        origins.insert(Site::Indeed, indeed.uri());
        origins.insert(Site::Pnet, pnet.uri());
        settings
    }

    fn indeed_page(cards: &[(&str, &str)]) -> String {
        let cards: String = cards
            .iter()
            .map(|(title, href)| {
                format!(
                    r#"<div class="job_seen_beacon">
                        <h2 class="jobTitle"><a href="{href}"><span>{title}</span></a></h2>
                        <span data-testid="company-name">Acme</span>
                        <div data-testid="text-location">Durban</div>
                    </div>"#
                )
            })
            .collect();
        format!("<html><body>{cards}</body></html>")
    }

    fn pnet_page(cards: &[(&str, &str)]) -> String {
        let cards: String = cards
            .iter()
            .map(|(title, href)| {
                format!(
                    r#"<article class="job-result">
                        <h2><a href="{href}">{title}</a></h2>
                        <span class="company">Acme</span>
                        <span class="location">Durban</span>
                    </article>"#
                )
            })
            .collect();
        format!("<html><body>{cards}</body></html>")
    }

    async fn serve(server: &MockServer, route: &str, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(response)
            .mount(server)
            .await;
    }

    fn scrape_post(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/scrape")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    const BOTH_SOURCES: &str =
        r#"{"query":"rust","location":"Durban","maxPages":1,"sources":["indeed","pnet"]}"#;

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_search_returns_hits() {
        let mut job = JobPosting::new("Rust Engineer", "Acme", "indeed").unwrap();
        job.url = "https://za.indeed.com/viewjob?jk=1".to_string();
        let app = router(state_with(&[job]));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/search?q=rust")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["total_results"], 1);
        assert_eq!(body["results"][0]["title"], "Rust Engineer");
        assert_eq!(body["results"][0]["jobType"], "Full-time");
        assert_eq!(body["results"][0]["url"], "https://za.indeed.com/viewjob?jk=1");
    }

    #[tokio::test]
    async fn test_search_without_query_is_empty() {
        let job = JobPosting::new("Rust Engineer", "Acme", "indeed").unwrap();
        let app = router(state_with(&[job]));

        let response = app
            .oneshot(Request::builder().uri("/search").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["total_results"], 0);
    }

    #[tokio::test]
    async fn test_scrape_rejects_zero_pages() {
        let app = router(state_with(&[]));

        let body = r#"{"query":"rust","location":"Cape Town","maxPages":0}"#;

        let response = app.oneshot(scrape_post(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["count"], 0);
        assert_eq!(body["source"], "indeed");
        assert!(body["error"].as_str().unwrap().contains("maxPages"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_scrape_merges_sources_and_drops_duplicates() {
        let indeed = MockServer::start().await;
        let pnet = MockServer::start().await;
        let shared_url = format!("{}/viewjob?jk=1", indeed.uri());
        serve(
            &indeed,
            "/jobs",
            ResponseTemplate::new(200).set_body_string(indeed_page(&[
                ("Rust Engineer", "/viewjob?jk=1"),
                ("Rust Lead", "/viewjob?jk=2"),
            ])),
        )
        .await;
        serve(
            &pnet,
            "/jobs/search-results.html",
            ResponseTemplate::new(200).set_body_string(pnet_page(&[
                ("Rust Engineer", &shared_url),
                ("Kotlin Developer", "/jobs/kotlin-3"),
            ])),
        )
        .await;

        let state = Arc::new(AppState::with_index(
            mock_settings(&indeed, &pnet),
            JobIndex::empty().unwrap(),
        ));
        let app = router(state);

        let request = scrape_post(BOTH_SOURCES);
        let response = app.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["totalCount"], 4);
        assert_eq!(body["count"], 3);
        assert_eq!(body["duplicatesRemoved"], 1);
        assert_eq!(body["sourceCounts"]["indeed"], 2);
        assert_eq!(body["sourceCounts"]["pnet"], 2);
        assert!(body.get("errors").is_none());
        assert_eq!(body["jobs"][0]["source"], "indeed");
        assert_eq!(body["jobs"][2]["title"], "Kotlin Developer");
        assert_eq!(
            body["jobs"][2]["url"],
            format!("{}/jobs/kotlin-3", pnet.uri())
        );

        let search = Request::builder()
            .uri("/search?q=kotlin")
            .body(Body::empty())
            .unwrap();
        let body = body_json(app.oneshot(search).await.unwrap()).await;
        assert_eq!(body["total_results"], 1);
        assert_eq!(body["results"][0]["source"], "pnet");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_scrape_keeps_sources_that_succeeded() {
        let indeed = MockServer::start().await;
        let pnet = MockServer::start().await;
        serve(
            &indeed,
            "/jobs",
            ResponseTemplate::new(200)
                .set_body_string(indeed_page(&[("Rust Engineer", "/viewjob?jk=1")])),
        )
        .await;
        serve(&pnet, "/jobs/search-results.html", ResponseTemplate::new(503)).await;

        let state = Arc::new(AppState::with_index(
            mock_settings(&indeed, &pnet),
            JobIndex::empty().unwrap(),
        ));

        let request = scrape_post(BOTH_SOURCES);
        let response = router(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["count"], 1);
        assert_eq!(body["sourceCounts"]["indeed"], 1);
        assert!(body["sourceCounts"].get("pnet").is_none());
        let errors = body["errors"].as_array().unwrap();
        assert_eq!(errors.len(), 1);
        let error = errors[0].as_str().unwrap();
        assert!(error.starts_with("pnet: "));
        assert!(error.contains("503"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_scrape_with_every_source_failing_is_bad_gateway() {
        let indeed = MockServer::start().await;
        let pnet = MockServer::start().await;
        serve(&indeed, "/jobs", ResponseTemplate::new(403)).await;
        serve(&pnet, "/jobs/search-results.html", ResponseTemplate::new(503)).await;

        let state = Arc::new(AppState::with_index(
            mock_settings(&indeed, &pnet),
            JobIndex::empty().unwrap(),
        ));

        let request = scrape_post(BOTH_SOURCES);
        let response = router(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["count"], 0);
        assert_eq!(body["errors"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_scrape_sources_rejects_zero_pages() {
        let app = router(state_with(&[]));
        let body = r#"{"query":"rust","location":"Durban","maxPages":0,"sources":["pnet"]}"#;

        let response = app.oneshot(scrape_post(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert!(body["errors"][0].as_str().unwrap().contains("maxPages"));
    }

    #[tokio::test]
    async fn test_scrape_rejects_unknown_source() {
        let app = router(state_with(&[]));
        let body = r#"{"query":"rust","location":"Durban","sources":["monster"]}"#;

        let response = app.oneshot(scrape_post(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
