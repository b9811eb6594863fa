use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::sentiment::SentimentPoint;

/// One stored row of the market data table: the BTC close and the FGI of that day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketDay {
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_usd: Decimal,
    pub fgi: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_usd: Decimal,
}

impl MarketDay {
    pub fn new(date: NaiveDate, price_usd: Decimal, fgi: u8) -> Self {
        Self {
            date,
            price_usd,
            fgi,
        }
    }

    /// A usable row has a positive price and an index within 0..=100
    pub fn is_valid(&self) -> bool {
        self.price_usd > Decimal::ZERO && self.fgi <= 100
    }

    pub fn price_point(&self) -> PricePoint {
        PricePoint {
            date: self.date,
            price_usd: self.price_usd,
        }
    }

    pub fn sentiment_point(&self) -> SentimentPoint {
        SentimentPoint {
            date: self.date,
            index: self.fgi,
        }
    }
}
