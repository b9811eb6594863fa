//! Import of the historical price / Fear & Greed CSV file.
//!
//! Expected columns: `Date` (dd.mm.YYYY), `Price` (comma as decimal
//! separator, e.g. `"9170,5"`) and `Fear and Greed` (integer 0-100).
//! Both `,` and `;` delimited files are accepted.

use crate::domain::market::MarketDay;
use crate::domain::repositories::MarketDataRepository;
use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

const CSV_DATE_FORMAT: &str = "%d.%m.%Y";

#[derive(Debug, Deserialize)]
struct MarketDataCsvRecord {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Price")]
    price: String,
    #[serde(rename = "Fear and Greed")]
    fear_and_greed: String,
}

impl MarketDataCsvRecord {
    fn parse(&self) -> Result<MarketDay> {
        let date = NaiveDate::parse_from_str(self.date.trim(), CSV_DATE_FORMAT)
            .with_context(|| format!("Invalid date '{}'", self.date))?;

        let normalized: String = self
            .price
            .trim()
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| if c == ',' { '.' } else { c })
            .collect();
        let price_usd = Decimal::from_str(&normalized)
            .with_context(|| format!("Invalid price '{}'", self.price))?;
        if price_usd <= Decimal::ZERO {
            bail!("Non-positive price '{}'", self.price);
        }

        let fgi: u8 = self
            .fear_and_greed
            .trim()
            .parse()
            .with_context(|| format!("Invalid Fear & Greed value '{}'", self.fear_and_greed))?;
        if fgi > 100 {
            bail!("Fear & Greed value {} out of range", fgi);
        }

        Ok(MarketDay::new(date, price_usd, fgi))
    }
}

/// Parses CSV content into market days, skipping malformed rows
pub fn parse_market_csv(content: &str) -> Result<Vec<MarketDay>> {
    let header = content.lines().next().ok_or_else(|| anyhow!("CSV file is empty"))?;
    let delimiter = if header.contains(';') { b';' } else { b',' };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::Headers)
        .from_reader(content.as_bytes());

    let mut days = Vec::new();
    for (line, result) in reader.deserialize::<MarketDataCsvRecord>().enumerate() {
        let parsed = result
            .map_err(anyhow::Error::from)
            .and_then(|record| record.parse());
        match parsed {
            Ok(day) => days.push(day),
            // +2: header line and 1-based numbering
            Err(e) => warn!("MarketDataImporter: Skipping line {}: {:#}", line + 2, e),
        }
    }
    Ok(days)
}

/// Loads the CSV file into a market data repository
pub struct MarketDataImporter {
    repository: Arc<dyn MarketDataRepository>,
}

impl MarketDataImporter {
    pub fn new(repository: Arc<dyn MarketDataRepository>) -> Self {
        Self { repository }
    }

    /// Imports the whole file, replacing rows with the same date
    pub async fn import_file(&self, path: &Path) -> Result<usize> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read CSV file {}", path.display()))?;
        let days = parse_market_csv(&content)?;
        if days.is_empty() {
            warn!("MarketDataImporter: No valid rows in {}", path.display());
            return Ok(0);
        }

        let written = self.repository.upsert_days(&days).await?;
        info!(
            "MarketDataImporter: Imported {} days from {}",
            written,
            path.display()
        );
        Ok(written)
    }

    /// Imports only when the store holds no rows. Returns rows written.
    pub async fn import_if_empty(&self, path: &Path) -> Result<usize> {
        let existing = self.repository.count().await?;
        if existing > 0 {
            info!(
                "MarketDataImporter: Store already holds {} days, skipping import",
                existing
            );
            return Ok(0);
        }
        if !path.exists() {
            warn!(
                "MarketDataImporter: {} not found, starting with an empty store",
                path.display()
            );
            return Ok(0);
        }
        self.import_file(path).await
    }
}
