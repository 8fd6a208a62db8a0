//! Decoded archive records.
//!
//! Records are plain values: produced fresh by every read, holding no
//! reference back into the archive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Side of the book a bar was sampled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceType {
    /// Bid prices (stored as `0`).
    Bid,
    /// Ask prices (stored as `1`).
    Ask,
}

impl PriceType {
    /// Map the stored discriminator onto a side.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(PriceType::Bid),
            1 => Some(PriceType::Ask),
            _ => None,
        }
    }

    /// Stored discriminator of this side.
    pub fn code(self) -> i64 {
        match self {
            PriceType::Bid => 0,
            PriceType::Ask => 1,
        }
    }

    /// Name used in archive file names.
    pub fn as_str(self) -> &'static str {
        match self {
            PriceType::Bid => "Bid",
            PriceType::Ask => "Ask",
        }
    }
}

/// One OHLCV bar.
///
/// `price_type` keeps the stored discriminator as-is; use [`Bar::side`] for
/// the typed view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Start of the bar interval.
    pub date_from: DateTime<Utc>,
    /// Stored side discriminator (`0` bid, `1` ask).
    pub price_type: i64,
    /// Traded volume.
    pub volume: f64,
    /// Opening price.
    pub open: f64,
    /// Closing price.
    pub close: f64,
    /// Highest price.
    pub high: f64,
    /// Lowest price.
    pub low: f64,
}

impl Bar {
    /// Typed side, or `None` for an unknown discriminator.
    pub fn side(&self) -> Option<PriceType> {
        PriceType::from_code(self.price_type)
    }
}

/// One level of an order-book ladder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuoteEntry {
    /// Price of the level.
    pub price: f64,
    /// Volume available at the level.
    pub volume: f64,
}

/// Order-book snapshot at one instant.
///
/// Both ladders keep the order they were stored in, which archives write
/// best price first. Depth is the same for every quote of one archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Snapshot time.
    pub date: DateTime<Utc>,
    /// Ask ladder.
    pub asks: Vec<QuoteEntry>,
    /// Bid ladder.
    pub bids: Vec<QuoteEntry>,
}

impl Quote {
    /// First ask level.
    pub fn best_ask(&self) -> Option<&QuoteEntry> {
        self.asks.first()
    }

    /// First bid level.
    pub fn best_bid(&self) -> Option<&QuoteEntry> {
        self.bids.first()
    }

    /// Number of levels per side.
    pub fn depth(&self) -> usize {
        self.asks.len().max(self.bids.len())
    }

    /// `best_ask - best_bid`, when both sides have a level.
    pub fn spread(&self) -> Option<f64> {
        Some(self.best_ask()?.price - self.best_bid()?.price)
    }
}
