//! OHLCV bar handling

use crate::error::{Result, TradeError};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One OHLCV bar
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    /// Bar timestamp
    pub timestamp: DateTime<Utc>,
    /// Open price
    pub open: f64,
    /// High price
    pub high: f64,
    /// Low price
    pub low: f64,
    /// Close price
    pub close: f64,
    /// Volume
    pub volume: f64,
}

impl Bar {
    /// Create a validated bar
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self> {
        let prices = [open, high, low, close];
        if prices.iter().any(|&p| !(p > 0.0 && p.is_finite())) {
            return Err(TradeError::DataError(format!(
                "Bar at {} has non-positive or non-finite prices",
                timestamp
            )));
        }
        if low > high || open > high || close > high || open < low || close < low {
            return Err(TradeError::DataError(format!(
                "Bar at {} has prices outside its high/low range",
                timestamp
            )));
        }
        if !(volume >= 0.0 && volume.is_finite()) {
            return Err(TradeError::DataError(format!(
                "Bar at {} has invalid volume {}",
                timestamp, volume
            )));
        }

        Ok(Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        })
    }

    /// Bar whose four prices all equal `price`
    pub fn flat(timestamp: DateTime<Utc>, price: f64) -> Result<Self> {
        Self::new(timestamp, price, price, price, price, 0.0)
    }
}

/// Raw CSV row before validation
#[derive(Debug, Deserialize)]
struct BarRecord {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: f64,
}

/// Parse an RFC 3339 timestamp or a plain `YYYY-MM-DD` date
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|date| {
            DateTime::<Utc>::from_naive_utc_and_offset(date.and_time(NaiveTime::MIN), Utc)
        })
        .map_err(|_| TradeError::DataError(format!("Unrecognized timestamp: {}", s)))
}

/// Load chronological bars from a CSV file
///
/// Expects a header row with `timestamp,open,high,low,close[,volume]`.
pub fn load_bars_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Bar>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut bars: Vec<Bar> = Vec::new();

    for record in reader.deserialize() {
        let record: BarRecord = record?;
        let timestamp = parse_timestamp(&record.timestamp)?;

        if let Some(prev) = bars.last() {
            if timestamp <= prev.timestamp {
                return Err(TradeError::DataError(format!(
                    "Bars are not chronological: {} follows {}",
                    timestamp, prev.timestamp
                )));
            }
        }

        bars.push(Bar::new(
            timestamp,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume,
        )?);
    }

    if bars.is_empty() {
        return Err(TradeError::DataError("No bars found in file".to_string()));
    }

    Ok(bars)
}

/// Closing prices of `bars`, in order
pub fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}
