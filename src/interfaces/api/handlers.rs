use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use chrono::NaiveDate;
use futures_util::stream::{self, Stream};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

use crate::application::market_data::snapshot_service::{chart_series, data_range, day_quote};
use crate::application::market_data::trend;
use crate::application::market_data::{ChartSeries, DataRange, DayQuote, TrendReport};
use crate::application::optimization::best_schedule::ScheduleOutcome;
use crate::application::optimization::simulator::{BacktestReport, BacktestRequest};
use crate::application::optimization::{OptimizeEngine, StrategyRequest};
use crate::domain::market::TrendPeriod;
use crate::domain::strategy::SmartDcaResult;
use crate::interfaces::api::dto::{
    BestDaysBody, BestDaysRequest, DateQuery, DcaBody, ResultShape, ShapeQuery, SmartDcaBody,
    SmartDcaRequest, StrategyBody, StreamQuery, TrendQuery,
};
use crate::interfaces::api::error::ApiError;

pub type ApiResult<T> = Result<Json<T>, ApiError>;

/// Fixed-amount DCA backtest.
pub async fn dca(
    State(engine): State<Arc<OptimizeEngine>>,
    body: Result<Json<DcaBody>, JsonRejection>,
) -> ApiResult<BacktestReport> {
    let Json(body) = body?;
    let request = BacktestRequest::try_from(body)?;
    Ok(Json(engine.backtest(request).await?))
}

/// Backtest of every (frequency, day) schedule, unranked.
pub async fn best_days(
    State(engine): State<Arc<OptimizeEngine>>,
    body: Result<Json<BestDaysBody>, JsonRejection>,
) -> ApiResult<Vec<ScheduleOutcome>> {
    let Json(body) = body?;
    let request = BestDaysRequest::try_from(body)?;
    Ok(Json(
        engine
            .best_schedules(request.amount_usd, request.start)
            .await?,
    ))
}

/// Sentiment-conditioned DCA with explicit parameters.
pub async fn smart_dca(
    State(engine): State<Arc<OptimizeEngine>>,
    body: Result<Json<SmartDcaBody>, JsonRejection>,
) -> ApiResult<SmartDcaResult> {
    let Json(body) = body?;
    let request = SmartDcaRequest::try_from(body)?;
    Ok(Json(engine.smart_dca(request.run, request.params).await?))
}

/// Two-phase grid search, answered once both phases are done.
pub async fn optimize(
    State(engine): State<Arc<OptimizeEngine>>,
    query: Result<Query<ShapeQuery>, QueryRejection>,
    body: Result<Json<StrategyBody>, JsonRejection>,
) -> ApiResult<Value> {
    let Query(query) = query?;
    let shape = ResultShape::try_from(query)?;
    let Json(body) = body?;
    let request = StrategyRequest::try_from(body)?;

    let result = engine.optimize_grid(request).await?;
    let value = match shape {
        ResultShape::Phased => serde_json::to_value(result.phased_view()),
        ResultShape::Legacy => serde_json::to_value(result.legacy_view()),
    }
    .map_err(anyhow::Error::from)?;
    Ok(Json(value))
}

/// Grid search streamed as server-sent events, one JSON event per phase step.
///
/// Dropping the connection drops the event stream, which cancels the run.
pub async fn optimize_stream(
    State(engine): State<Arc<OptimizeEngine>>,
    query: Result<Query<StreamQuery>, QueryRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let Query(query) = query?;
    let request = StrategyRequest::try_from(query)?;
    let progress = engine.stream_grid(request).await?;
    info!(
        "API: Streaming grid run {} ({} {} from {})",
        progress.run_id(),
        request.amount_usd,
        request.frequency,
        request.start
    );

    let events = stream::unfold(progress, |mut progress| async move {
        let event = progress.recv().await?;
        Some((Event::default().json_data(&event), progress))
    });
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

#[derive(Serialize)]
pub struct GeneticResponse {
    pub best: crate::domain::optimization::OptimizationCandidate,
    pub tested: usize,
}

/// Genetic search with the configured population settings.
pub async fn optimize_genetic(
    State(engine): State<Arc<OptimizeEngine>>,
    body: Result<Json<StrategyBody>, JsonRejection>,
) -> ApiResult<GeneticResponse> {
    let Json(body) = body?;
    let request = StrategyRequest::try_from(body)?;
    let result = engine.optimize_genetic(request, None).await?;
    Ok(Json(GeneticResponse {
        best: result.best,
        tested: result.tested_count,
    }))
}

pub async fn fg_trend(
    State(engine): State<Arc<OptimizeEngine>>,
    query: Result<Query<TrendQuery>, QueryRejection>,
) -> ApiResult<TrendReport> {
    let Query(query) = query?;
    let period = TrendPeriod::try_from(query)?;
    let snapshot = engine.market_data().snapshot().await?;
    Ok(Json(trend::aggregate(&snapshot, period)?))
}

pub async fn chart_data(State(engine): State<Arc<OptimizeEngine>>) -> ApiResult<ChartSeries> {
    let snapshot = engine.market_data().snapshot().await?;
    Ok(Json(chart_series(&snapshot)))
}

pub async fn data_for_date(
    State(engine): State<Arc<OptimizeEngine>>,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> ApiResult<DayQuote> {
    let Query(query) = query?;
    let date = NaiveDate::try_from(query)?;
    let snapshot = engine.market_data().snapshot().await?;
    Ok(Json(day_quote(&snapshot, date)?))
}

pub async fn available_range(State(engine): State<Arc<OptimizeEngine>>) -> ApiResult<DataRange> {
    let snapshot = engine.market_data().snapshot().await?;
    Ok(Json(data_range(&snapshot)?))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}
