//! Raw daily price model.
//!
//! A [`PriceSeries`] can only be built through [`PriceSeries::new`], which
//! validates every bar before anything downstream sees it. Once built the
//! series is immutable: adjusters and calculators borrow it and never write
//! back.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// PriceBar
// ---------------------------------------------------------------------------

/// One raw (unadjusted) daily bar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    /// Raw close as reported by the vendor.
    pub close: f64,
    /// Cash dividend per share with ex-date on this bar. `0.0` when none.
    #[serde(default)]
    pub dividend: f64,
    /// Split ratio effective on this bar (2.0 for 2-for-1). `1.0` when none.
    #[serde(default = "default_split_coefficient")]
    pub split_coefficient: f64,
}

fn default_split_coefficient() -> f64 {
    1.0
}

impl PriceBar {
    /// A bar with no corporate action.
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            close,
            dividend: 0.0,
            split_coefficient: 1.0,
        }
    }

    pub fn with_dividend(mut self, dividend: f64) -> Self {
        self.dividend = dividend;
        self
    }

    pub fn with_split(mut self, split_coefficient: f64) -> Self {
        self.split_coefficient = split_coefficient;
        self
    }

    /// True when this bar carries a split or a dividend.
    pub fn has_corporate_action(&self) -> bool {
        self.split_coefficient != 1.0 || self.dividend > 0.0
    }
}

// ---------------------------------------------------------------------------
// InvalidInput
// ---------------------------------------------------------------------------

/// Structural rejection of a raw series.
///
/// Every variant names the ticker and the offending date so the record can be
/// located in the source feed.
#[derive(Clone, Debug, PartialEq)]
pub enum InvalidInput {
    /// `split_coefficient <= 0`.
    NonPositiveSplit {
        ticker: String,
        date: NaiveDate,
        value: f64,
    },
    /// `dividend < 0`.
    NegativeDividend {
        ticker: String,
        date: NaiveDate,
        value: f64,
    },
    /// `close < 0`.
    NegativeClose {
        ticker: String,
        date: NaiveDate,
        value: f64,
    },
    /// NaN or infinite value in a numeric field.
    NonFiniteValue {
        ticker: String,
        date: NaiveDate,
        field: &'static str,
    },
    /// A bar dated before its predecessor.
    NonMonotonicDate {
        ticker: String,
        date: NaiveDate,
        prev_date: NaiveDate,
    },
    /// Two bars share a date.
    DuplicateDate { ticker: String, date: NaiveDate },
}

impl InvalidInput {
    pub fn ticker(&self) -> &str {
        match self {
            InvalidInput::NonPositiveSplit { ticker, .. }
            | InvalidInput::NegativeDividend { ticker, .. }
            | InvalidInput::NegativeClose { ticker, .. }
            | InvalidInput::NonFiniteValue { ticker, .. }
            | InvalidInput::NonMonotonicDate { ticker, .. }
            | InvalidInput::DuplicateDate { ticker, .. } => ticker,
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            InvalidInput::NonPositiveSplit { date, .. }
            | InvalidInput::NegativeDividend { date, .. }
            | InvalidInput::NegativeClose { date, .. }
            | InvalidInput::NonFiniteValue { date, .. }
            | InvalidInput::NonMonotonicDate { date, .. }
            | InvalidInput::DuplicateDate { date, .. } => *date,
        }
    }
}

impl fmt::Display for InvalidInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidInput::NonPositiveSplit {
                ticker,
                date,
                value,
            } => write!(
                f,
                "invalid input: {} @ {}: split_coefficient {} must be > 0",
                ticker, date, value
            ),
            InvalidInput::NegativeDividend {
                ticker,
                date,
                value,
            } => write!(
                f,
                "invalid input: {} @ {}: dividend {} must be >= 0",
                ticker, date, value
            ),
            InvalidInput::NegativeClose {
                ticker,
                date,
                value,
            } => write!(
                f,
                "invalid input: {} @ {}: close {} must be >= 0",
                ticker, date, value
            ),
            InvalidInput::NonFiniteValue {
                ticker,
                date,
                field,
            } => write!(
                f,
                "invalid input: {} @ {}: {} is not a finite number",
                ticker, date, field
            ),
            InvalidInput::NonMonotonicDate {
                ticker,
                date,
                prev_date,
            } => write!(
                f,
                "invalid input: {} @ {}: date precedes previous bar {}",
                ticker, date, prev_date
            ),
            InvalidInput::DuplicateDate { ticker, date } => {
                write!(f, "invalid input: {} @ {}: duplicate date", ticker, date)
            }
        }
    }
}

impl std::error::Error for InvalidInput {}

// ---------------------------------------------------------------------------
// PriceSeries
// ---------------------------------------------------------------------------

/// A validated, strictly date-ascending raw series for one ticker.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceSeries {
    ticker: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Validate `bars` and take ownership of them.
    ///
    /// Fails on the first offending bar in input order. Bars are never sorted
    /// or repaired here: an out-of-order feed is a feed bug.
    pub fn new(ticker: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self, InvalidInput> {
        let ticker = ticker.into();
        validate_bars(&ticker, &bars)?;
        Ok(Self { ticker, bars })
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }
}

/// Structural validation shared by [`PriceSeries::new`] and callers that
/// only need a yes/no answer.
pub fn validate_bars(ticker: &str, bars: &[PriceBar]) -> Result<(), InvalidInput> {
    let mut prev: Option<NaiveDate> = None;

    for bar in bars {
        let date = bar.date;
        let non_finite = |field: &'static str| InvalidInput::NonFiniteValue {
            ticker: ticker.to_string(),
            date,
            field,
        };

        if !bar.close.is_finite() {
            return Err(non_finite("close"));
        }
        if !bar.dividend.is_finite() {
            return Err(non_finite("dividend"));
        }
        if !bar.split_coefficient.is_finite() {
            return Err(non_finite("split_coefficient"));
        }
        if bar.split_coefficient <= 0.0 {
            return Err(InvalidInput::NonPositiveSplit {
                ticker: ticker.to_string(),
                date,
                value: bar.split_coefficient,
            });
        }
        if bar.dividend < 0.0 {
            return Err(InvalidInput::NegativeDividend {
                ticker: ticker.to_string(),
                date,
                value: bar.dividend,
            });
        }
        if bar.close < 0.0 {
            return Err(InvalidInput::NegativeClose {
                ticker: ticker.to_string(),
                date,
                value: bar.close,
            });
        }

        if let Some(p) = prev {
            if date == p {
                return Err(InvalidInput::DuplicateDate {
                    ticker: ticker.to_string(),
                    date,
                });
            }
            if date < p {
                return Err(InvalidInput::NonMonotonicDate {
                    ticker: ticker.to_string(),
                    date,
                    prev_date: p,
                });
            }
        }
        prev = Some(date);
    }

    Ok(())
}
