//! In-memory market data store
//!
//! Thread-safe (`Arc<RwLock>`) implementation of `MarketDataRepository`,
//! keyed by date so upserts replace existing rows. Data is lost on restart;
//! it backs tests and throwaway runs.

use crate::domain::market::{MarketDay, MarketSnapshot};
use crate::domain::repositories::MarketDataRepository;
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct InMemoryMarketDataRepository {
    days: Arc<RwLock<BTreeMap<NaiveDate, MarketDay>>>,
}

impl InMemoryMarketDataRepository {
    pub fn new(days: Vec<MarketDay>) -> Self {
        Self {
            days: Arc::new(RwLock::new(
                days.into_iter().map(|day| (day.date, day)).collect(),
            )),
        }
    }
}

impl Default for InMemoryMarketDataRepository {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl MarketDataRepository for InMemoryMarketDataRepository {
    async fn load_snapshot(&self) -> Result<MarketSnapshot> {
        let days = self.days.read().await;
        Ok(MarketSnapshot::new(days.values().copied().collect()))
    }

    async fn upsert_days(&self, days: &[MarketDay]) -> Result<usize> {
        let mut stored = self.days.write().await;
        for day in days {
            stored.insert(day.date, *day);
        }
        Ok(days.len())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.days.read().await.len())
    }
}
