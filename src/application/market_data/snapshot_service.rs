use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::domain::errors::DataError;
use crate::domain::market::{MarketDay, MarketSnapshot};
use crate::domain::repositories::MarketDataRepository;

/// Full price and sentiment history, one entry per stored day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub dates: Vec<NaiveDate>,
    pub prices: Vec<f64>,
    pub fg: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DayQuote {
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub fg: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DataRange {
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
    pub days: usize,
}

/// Hands out the current immutable snapshot of the market data table.
///
/// The snapshot is loaded lazily and shared by every run until `reload`
/// swaps in a new one; runs already holding the old `Arc` are unaffected.
pub struct MarketDataService {
    repository: Arc<dyn MarketDataRepository>,
    current: RwLock<Option<Arc<MarketSnapshot>>>,
}

impl MarketDataService {
    pub fn new(repository: Arc<dyn MarketDataRepository>) -> Self {
        Self {
            repository,
            current: RwLock::new(None),
        }
    }

    pub fn repository(&self) -> &Arc<dyn MarketDataRepository> {
        &self.repository
    }

    pub async fn snapshot(&self) -> Result<Arc<MarketSnapshot>> {
        if let Some(snapshot) = self.current.read().await.as_ref() {
            return Ok(snapshot.clone());
        }
        self.reload().await
    }

    pub async fn reload(&self) -> Result<Arc<MarketSnapshot>> {
        let mut current = self.current.write().await;
        let snapshot = Arc::new(
            self.repository
                .load_snapshot()
                .await
                .context("Failed to load market data snapshot")?,
        );
        info!(
            "MarketDataService: Loaded {} days ({:?} .. {:?})",
            snapshot.len(),
            snapshot.first_date(),
            snapshot.last_date()
        );
        *current = Some(snapshot.clone());
        Ok(snapshot)
    }
}

pub fn chart_series(snapshot: &MarketSnapshot) -> ChartSeries {
    let days = snapshot.days();
    ChartSeries {
        dates: days.iter().map(|d| d.date).collect(),
        prices: days
            .iter()
            .map(|d| d.price_usd.to_f64().unwrap_or_default())
            .collect(),
        fg: days.iter().map(|d| d.fgi).collect(),
    }
}

pub fn day_quote(snapshot: &MarketSnapshot, date: NaiveDate) -> Result<DayQuote, DataError> {
    snapshot
        .day(date)
        .map(|day: &MarketDay| DayQuote {
            price: day.price_usd,
            fg: day.fgi,
        })
        .ok_or(DataError::DateNotFound { date })
}

pub fn data_range(snapshot: &MarketSnapshot) -> Result<DataRange, DataError> {
    match (snapshot.first_date(), snapshot.last_date()) {
        (Some(min_date), Some(max_date)) => Ok(DataRange {
            min_date,
            max_date,
            days: snapshot.len(),
        }),
        _ => Err(DataError::EmptyStore),
    }
}
