use crate::domain::market::{MarketDay, MarketSnapshot};
use crate::domain::repositories::MarketDataRepository;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use sqlx::{Row, SqlitePool};
use tracing::{info, warn};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteMarketDataRepository {
    pool: SqlitePool,
}

impl SqliteMarketDataRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_rows_to_days(&self, rows: Vec<sqlx::sqlite::SqliteRow>) -> Result<Vec<MarketDay>> {
        let mut days = Vec::with_capacity(rows.len());
        for row in rows {
            let date_str: String = row.try_get("date")?;
            let Ok(date) = NaiveDate::parse_from_str(&date_str, DATE_FORMAT) else {
                warn!("SqliteMarketDataRepository: Skipping row with bad date {}", date_str);
                continue;
            };
            let price: f64 = row.try_get("price")?;
            let fg: i64 = row.try_get("fg")?;

            let price_usd = match Decimal::from_f64(price).map(|p| p.normalize()) {
                Some(p) if p > Decimal::ZERO => p,
                _ => {
                    warn!("SqliteMarketDataRepository: Skipping {} with price {}", date, price);
                    continue;
                }
            };
            let fgi = match u8::try_from(fg) {
                Ok(fgi) if fgi <= 100 => fgi,
                _ => {
                    warn!("SqliteMarketDataRepository: Skipping {} with fg {}", date, fg);
                    continue;
                }
            };

            days.push(MarketDay::new(date, price_usd, fgi));
        }
        Ok(days)
    }
}

#[async_trait]
impl MarketDataRepository for SqliteMarketDataRepository {
    async fn load_snapshot(&self) -> Result<MarketSnapshot> {
        let rows = sqlx::query("SELECT date, price, fg FROM market_data ORDER BY date ASC")
            .fetch_all(&self.pool)
            .await
            .context("Failed to load market data")?;
        Ok(MarketSnapshot::new(self.map_rows_to_days(rows)?))
    }

    async fn upsert_days(&self, days: &[MarketDay]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        for day in days {
            sqlx::query(
                r#"
                INSERT INTO market_data (date, price, fg)
                VALUES (?, ?, ?)
                ON CONFLICT(date) DO UPDATE SET price = excluded.price, fg = excluded.fg
                "#,
            )
            .bind(day.date.format(DATE_FORMAT).to_string())
            .bind(day.price_usd.to_f64().unwrap_or_default())
            .bind(i64::from(day.fgi))
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to upsert market data for {}", day.date))?;
        }
        tx.commit().await?;

        info!("SqliteMarketDataRepository: Upserted {} days", days.len());
        Ok(days.len())
    }

    async fn count(&self) -> Result<usize> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM market_data")
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = row.try_get("count")?;
        Ok(count as usize)
    }
}
