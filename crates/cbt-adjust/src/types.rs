use chrono::NaiveDate;
use serde::Serialize;

use cbt_md::PriceBar;

/// A raw bar plus its derived adjusted close.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AdjustedPriceBar {
    pub date: NaiveDate,
    pub close: f64,
    pub dividend: f64,
    pub split_coefficient: f64,
    pub adj_close: f64,
}

impl AdjustedPriceBar {
    pub(crate) fn from_raw(bar: &PriceBar, adj_close: f64) -> Self {
        Self {
            date: bar.date,
            close: bar.close,
            dividend: bar.dividend,
            split_coefficient: bar.split_coefficient,
            adj_close,
        }
    }
}

/// Adjusted series for one ticker: same length and order as its raw source.
///
/// Only built by [`crate::recompute`], so bars are always strictly ascending
/// by date.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AdjustedSeries {
    ticker: String,
    bars: Vec<AdjustedPriceBar>,
}

impl AdjustedSeries {
    pub(crate) fn from_parts(ticker: String, bars: Vec<AdjustedPriceBar>) -> Self {
        Self { ticker, bars }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[AdjustedPriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Index of the first bar dated on or after `date`, if any.
    pub fn first_index_on_or_after(&self, date: NaiveDate) -> Option<usize> {
        let i = self.bars.partition_point(|b| b.date < date);
        (i < self.bars.len()).then_some(i)
    }
}

/// Cumulative multiplier applied to one bar's raw close.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AdjustmentFactor {
    pub date: NaiveDate,
    pub multiplier: f64,
}
