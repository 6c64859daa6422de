//! api.rs — thin HTTP surface over the analysis pipeline.
//!
//! Two routes: `GET /health` and `GET /analyze?url=...&days=30`. Errors are
//! never propagated as faults; the handler always answers with a structured
//! body carrying the original query and window so the caller can retry or
//! correct input.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::analysis::AnalyzerConfig;
use crate::narrative::DynNarrativeClient;
use crate::provider::MetricsProvider;
use crate::report;

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn MetricsProvider>,
    pub narrative: DynNarrativeClient,
    pub config: AnalyzerConfig,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn MetricsProvider>,
        narrative: DynNarrativeClient,
        config: AnalyzerConfig,
    ) -> Self {
        Self {
            provider,
            narrative,
            config,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/analyze", get(analyze))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

fn default_days() -> i64 {
    30
}

#[derive(serde::Deserialize)]
struct AnalyzeParams {
    /// Channel URL, @handle, or plain name.
    url: String,
    /// Signed so that a negative window still reaches the structured error
    /// body instead of dying in the query extractor.
    #[serde(default = "default_days")]
    days: i64,
}

#[derive(serde::Serialize)]
struct ErrorBody {
    error: String,
    query: String,
    window_days: i64,
}

async fn analyze(State(state): State<AppState>, Query(params): Query<AnalyzeParams>) -> Response {
    let outcome = match u32::try_from(params.days) {
        Ok(days) => {
            report::get_channel_report(
                state.provider.as_ref(),
                state.narrative.as_ref(),
                &state.config,
                &params.url,
                days,
            )
            .await
        }
        Err(_) => Err(crate::error::AnalyzeError::validation(format!(
            "window must be a positive number of days, got {}",
            params.days
        ))),
    };
    match outcome {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => {
            tracing::warn!(
                error = %e,
                provider = state.provider.name(),
                query = %params.url,
                days = params.days,
                "analyze failed"
            );
            let body = ErrorBody {
                error: e.to_string(),
                query: params.url,
                window_days: params.days,
            };
            (e.status(), Json(body)).into_response()
        }
    }
}
