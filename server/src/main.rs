//! Job Search Server
//!
//! Exposes the job scraper over a REST API using Axum and keeps the most
//! recent successful scrape searchable with an in-memory Tantivy index.

use std::sync::Arc;

use anyhow::Context;
use job_scraper::{Settings, telemetry};
use tracing::info;

mod index;
mod routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_telemetry();

    let settings = Settings::new().context("failed to load settings")?;
    let addr = format!("{}:{}", settings.server.host, settings.server.port);

    let state = Arc::new(routes::AppState::new(settings)?);
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("server running at http://{}", addr);
    info!("try: curl 'http://{}/search?q=developer'", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
