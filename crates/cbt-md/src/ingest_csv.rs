//! CSV ingestion for raw price series and event lists.
//!
//! This is the read side only. Rows are grouped per ticker in file order and
//! handed back unvalidated; structural validation happens when the caller
//! builds a [`crate::PriceSeries`], so a bad ticker can be rejected on its own
//! without failing the whole file.
//!
//! ## Prices CSV
//!
//! | Column              | Example      | Notes                      |
//! |---------------------|--------------|----------------------------|
//! | `ticker`            | `AAPL`       |                            |
//! | `date`              | `2024-01-05` | `YYYY-MM-DD`               |
//! | `close`             | `184.50`     | raw close                  |
//! | `dividend`          | `0.24`       | optional, default `0`      |
//! | `split_coefficient` | `4.0`        | optional, default `1`      |
//!
//! ## Events CSV
//!
//! `ticker,event_date,catalyst`

use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

use crate::types::PriceBar;
use crate::Event;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum CsvIngestError {
    /// File could not be opened or read.
    Io(String),
    /// A record failed to decode (bad header, bad number, bad date).
    Record { row: usize, reason: String },
    /// A row has an empty ticker.
    EmptyTicker { row: usize },
}

impl fmt::Display for CsvIngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CsvIngestError::Io(msg) => write!(f, "csv io error: {msg}"),
            CsvIngestError::Record { row, reason } => write!(f, "csv row {row}: {reason}"),
            CsvIngestError::EmptyTicker { row } => write!(f, "csv row {row}: ticker is empty"),
        }
    }
}

impl std::error::Error for CsvIngestError {}

// ---------------------------------------------------------------------------
// Row shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PriceRow {
    ticker: String,
    date: NaiveDate,
    close: f64,
    #[serde(default)]
    dividend: Option<f64>,
    #[serde(default)]
    split_coefficient: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct EventRow {
    ticker: String,
    event_date: NaiveDate,
    #[serde(default)]
    catalyst: String,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Read a prices CSV from disk. See [`parse_prices_str`].
pub fn parse_prices_file(path: &Path) -> Result<BTreeMap<String, Vec<PriceBar>>, CsvIngestError> {
    parse_prices_str(&read_file(path)?)
}

/// Parse prices CSV text into per-ticker bar lists, preserving file order
/// within each ticker.
pub fn parse_prices_str(src: &str) -> Result<BTreeMap<String, Vec<PriceBar>>, CsvIngestError> {
    let mut rdr = reader(src);
    let mut out: BTreeMap<String, Vec<PriceBar>> = BTreeMap::new();

    for (i, rec) in rdr.deserialize::<PriceRow>().enumerate() {
        let row = i + 2; // header is row 1
        let r = rec.map_err(|e| CsvIngestError::Record {
            row,
            reason: e.to_string(),
        })?;

        let ticker = r.ticker.trim().to_string();
        if ticker.is_empty() {
            return Err(CsvIngestError::EmptyTicker { row });
        }

        out.entry(ticker).or_default().push(PriceBar {
            date: r.date,
            close: r.close,
            dividend: r.dividend.unwrap_or(0.0),
            split_coefficient: r.split_coefficient.unwrap_or(1.0),
        });
    }

    debug!(tickers = out.len(), "parsed prices csv");
    Ok(out)
}

/// Read an events CSV from disk. See [`parse_events_str`].
pub fn parse_events_file(path: &Path) -> Result<Vec<Event>, CsvIngestError> {
    parse_events_str(&read_file(path)?)
}

/// Parse events CSV text. Order is preserved; the aggregator sorts samples
/// itself.
pub fn parse_events_str(src: &str) -> Result<Vec<Event>, CsvIngestError> {
    let mut rdr = reader(src);
    let mut out = Vec::new();

    for (i, rec) in rdr.deserialize::<EventRow>().enumerate() {
        let row = i + 2;
        let r = rec.map_err(|e| CsvIngestError::Record {
            row,
            reason: e.to_string(),
        })?;

        let ticker = r.ticker.trim().to_string();
        if ticker.is_empty() {
            return Err(CsvIngestError::EmptyTicker { row });
        }

        out.push(Event::new(ticker, r.event_date, r.catalyst.trim()));
    }

    debug!(events = out.len(), "parsed events csv");
    Ok(out)
}

fn reader(src: &str) -> csv::Reader<&[u8]> {
    // Strip a UTF-8 BOM so the first header matches.
    let src = src.trim_start_matches('\u{feff}');
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(src.as_bytes())
}

fn read_file(path: &Path) -> Result<String, CsvIngestError> {
    let mut file = std::fs::File::open(path)
        .map_err(|e| CsvIngestError::Io(format!("open '{}': {e}", path.display())))?;
    let mut buf = String::new();
    file.read_to_string(&mut buf)
        .map_err(|e| CsvIngestError::Io(format!("read '{}': {e}", path.display())))?;
    Ok(buf)
}
