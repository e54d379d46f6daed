//! cbt-md
//!
//! Raw daily price model, event model, and CSV ingestion.
//!
//! This crate does not fetch from vendors and does not adjust prices. It
//! hands validated [`PriceSeries`] values to `cbt-adjust`, and [`Event`] lists
//! to `cbt-backtest`.

pub mod ingest_csv;
pub mod quality;
mod types;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use ingest_csv::{
    parse_events_file, parse_events_str, parse_prices_file, parse_prices_str, CsvIngestError,
};
pub use quality::{build_quality_report, QualityReport};
pub use types::{validate_bars, InvalidInput, PriceBar, PriceSeries};

/// A dated event for one ticker, as produced by the upstream scorer.
///
/// `catalyst` is an opaque label used only as a filter key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub ticker: String,
    pub event_date: NaiveDate,
    pub catalyst: String,
}

impl Event {
    pub fn new(ticker: impl Into<String>, event_date: NaiveDate, catalyst: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            event_date,
            catalyst: catalyst.into(),
        }
    }
}
