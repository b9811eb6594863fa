//! Repository abstractions over the market data table.
//!
//! The SQLite implementation backs the server and CLI; the in-memory one
//! backs tests. Engines never query a repository directly: they work on the
//! `MarketSnapshot` loaded once per run.

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::market::{MarketDay, MarketSnapshot};

#[async_trait]
pub trait MarketDataRepository: Send + Sync {
    /// Loads every stored row as an immutable snapshot
    async fn load_snapshot(&self) -> Result<MarketSnapshot>;

    /// Inserts rows, replacing existing rows with the same date. Returns rows written.
    async fn upsert_days(&self, days: &[MarketDay]) -> Result<usize>;

    async fn count(&self) -> Result<usize>;
}
