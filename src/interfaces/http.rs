//! HTTP API consumed by the dashboard.
//!
//! Every route answers both with and without a trailing slash. CORS is wide
//! open so the dashboard can be served from any origin.

use crate::application::pipelines::{PipelineContext, RegressionPipeline, TimeSeriesPipeline};
use crate::domain::audit::LogEntry;
use crate::domain::prediction::{RegressionOutcome, TimeSeriesPrediction};
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Json};
use axum::routing::{MethodRouter, get};
use axum::Router;
use serde_json::{Value, json};
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub ctx: PipelineContext,
    started: Instant,
}

impl AppState {
    pub fn new(ctx: PipelineContext) -> Self {
        Self {
            ctx,
            started: Instant::now(),
        }
    }
}

async fn root() -> Json<Value> {
    Json(json!({"message": "farcry backend working..."}))
}

async fn predict_regression(State(state): State<AppState>) -> Json<RegressionOutcome> {
    Json(RegressionPipeline::new(state.ctx.clone()).run().await)
}

async fn predict_time_series(
    State(state): State<AppState>,
) -> Result<Json<TimeSeriesPrediction>, (StatusCode, Json<Value>)> {
    TimeSeriesPipeline::new(state.ctx.clone())
        .run()
        .await
        .map(Json)
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"detail": e.to_string()})),
            )
        })
}

async fn logs(State(state): State<AppState>) -> Json<Option<Vec<LogEntry>>> {
    Json(state.ctx.audit.recent().await)
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "market_data": state.ctx.market_data.name(),
        "uptime_seconds": state.started.elapsed().as_secs(),
    }))
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    state
        .ctx
        .metrics
        .uptime_seconds
        .set(state.started.elapsed().as_secs_f64());
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.ctx.metrics.render(),
    )
}

/// Registers `handler` under `path` and `path/`.
fn with_slash(router: Router<AppState>, path: &str, handler: MethodRouter<AppState>) -> Router<AppState> {
    router
        .route(path, handler.clone())
        .route(&format!("{}/", path), handler)
}

pub fn router(ctx: PipelineContext) -> Router {
    let app = Router::new().route("/", get(root));
    let app = with_slash(app, "/predictRegression", get(predict_regression));
    let app = with_slash(app, "/predictTimeSeries", get(predict_time_series));
    let app = with_slash(app, "/logs", get(logs));
    let app = with_slash(app, "/health", get(health));
    let app = with_slash(app, "/metrics", get(metrics));

    app.layer(CorsLayer::permissive())
        .with_state(AppState::new(ctx))
}

/// Serves the API on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, ctx: PipelineContext, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!("HTTP API listening on {}", listener.local_addr()?);
    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
