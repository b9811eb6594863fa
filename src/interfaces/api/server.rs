use axum::Router;
use axum::extract::{MatchedPath, Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::application::optimization::OptimizeEngine;
use crate::interfaces::api::handlers;

pub struct ApiServer {
    engine: Arc<OptimizeEngine>,
}

impl ApiServer {
    pub fn new(engine: Arc<OptimizeEngine>) -> Self {
        Self { engine }
    }

    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/api/dca", post(handlers::dca))
            .route("/api/best-days", post(handlers::best_days))
            .route("/api/smart-dca", post(handlers::smart_dca))
            .route("/api/optimize", post(handlers::optimize))
            .route("/api/optimize-stream", get(handlers::optimize_stream))
            .route("/api/optimize-genetic", post(handlers::optimize_genetic))
            .route("/api/fg-trend", get(handlers::fg_trend))
            .route("/api/chart-data", get(handlers::chart_data))
            .route("/api/data", get(handlers::data_for_date))
            .route("/api/data-range", get(handlers::available_range))
            .route("/health", get(handlers::health))
            .route_layer(middleware::from_fn_with_state(
                self.engine.clone(),
                track_latency,
            ))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(self.engine.clone())
    }

    /// Starts the web server listening on the specified address.
    pub async fn serve(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("ApiServer: Listening on {}", addr);

        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}

/// Records handler latency by route
async fn track_latency(
    State(engine): State<Arc<OptimizeEngine>>,
    matched: Option<MatchedPath>,
    request: Request,
    next: Next,
) -> Response {
    let endpoint = matched
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let started = Instant::now();
    let response = next.run(request).await;
    engine
        .metrics()
        .observe_latency(&endpoint, started.elapsed().as_secs_f64());
    response
}
