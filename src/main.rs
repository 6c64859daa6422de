//! Creator Funding Analyzer — binary entrypoint.
//! Boots the Axum HTTP server, wiring the YouTube provider, the narrative
//! client, and the analyzer configuration into shared state.

use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use creator_funding_analyzer::analysis::AnalyzerConfig;
use creator_funding_analyzer::api::{self, AppState};
use creator_funding_analyzer::narrative;
use creator_funding_analyzer::provider::youtube::YouTubeProvider;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("creator_funding_analyzer=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = AnalyzerConfig::load_default()?;
    let provider = Arc::new(YouTubeProvider::from_env()?);
    let narrative = narrative::build_narrative_client();

    let state = AppState::new(provider, narrative, config);
    let router = api::router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "creator-funding-analyzer listening");
    axum::serve(listener, router).await?;
    Ok(())
}
