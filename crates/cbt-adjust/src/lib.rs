//! cbt-adjust
//!
//! Adjusted-close reconstruction from a raw daily series.
//!
//! # Algorithm
//!
//! One backward pass, newest bar first, with a running multiplier `carry`
//! starting at 1:
//!
//! 1. `adj_close = close * carry` for the current bar.
//! 2. Fold the current bar's own corporate action into `carry` for the bars
//!    before it:
//!    - split: `carry *= 1 / split_coefficient`
//!    - dividend: `carry *= (prior_close - dividend) / prior_close`, where
//!      `prior_close` is the raw close of the immediately preceding bar.
//!
//! An action never re-prices its own bar, only strictly earlier ones.
//!
//! # Degenerate inputs
//!
//! - A dividend on the oldest bar has no prior close and is ignored.
//! - A zero prior close leaves the dividend factor at 1.
//! - A dividend larger than the prior close gives a negative factor. It is
//!   kept as computed; see `cbt_md::quality` for flagging it.

mod types;

use tracing::debug;

use cbt_md::{InvalidInput, PriceBar, PriceSeries};

pub use types::{AdjustedPriceBar, AdjustedSeries, AdjustmentFactor};

/// Recompute adjusted closes for a validated series.
///
/// Pure: the same series always yields the same output, bit for bit.
pub fn recompute(series: &PriceSeries) -> AdjustedSeries {
    let bars = series.bars();
    let carries = backward_carries(bars);

    let adjusted: Vec<AdjustedPriceBar> = bars
        .iter()
        .zip(carries.iter())
        .map(|(bar, carry)| AdjustedPriceBar::from_raw(bar, bar.close * carry))
        .collect();

    debug!(
        ticker = %series.ticker(),
        bars = adjusted.len(),
        actions = bars.iter().filter(|b| b.has_corporate_action()).count(),
        "recomputed adjusted series"
    );

    AdjustedSeries::from_parts(series.ticker().to_string(), adjusted)
}

/// Validate raw bars, then recompute.
///
/// Nothing is computed for a rejected series.
pub fn recompute_bars(ticker: &str, bars: &[PriceBar]) -> Result<AdjustedSeries, InvalidInput> {
    let series = PriceSeries::new(ticker, bars.to_vec())?;
    Ok(recompute(&series))
}

/// The cumulative multiplier applied to each bar, in series order.
pub fn factors(series: &PriceSeries) -> Vec<AdjustmentFactor> {
    let bars = series.bars();
    backward_carries(bars)
        .into_iter()
        .zip(bars.iter())
        .map(|(multiplier, bar)| AdjustmentFactor {
            date: bar.date,
            multiplier,
        })
        .collect()
}

/// `carry` in effect for each bar, indexed like `bars`.
fn backward_carries(bars: &[PriceBar]) -> Vec<f64> {
    let mut out = vec![1.0; bars.len()];
    let mut carry = 1.0_f64;

    for i in (0..bars.len()).rev() {
        out[i] = carry;

        let bar = &bars[i];
        let prior_close = if i > 0 { Some(bars[i - 1].close) } else { None };
        carry *= split_factor(bar) * dividend_factor(bar, prior_close);
    }

    out
}

fn split_factor(bar: &PriceBar) -> f64 {
    if bar.split_coefficient != 1.0 {
        1.0 / bar.split_coefficient
    } else {
        1.0
    }
}

fn dividend_factor(bar: &PriceBar, prior_close: Option<f64>) -> f64 {
    match prior_close {
        Some(pc) if bar.dividend > 0.0 && pc != 0.0 => (pc - bar.dividend) / pc,
        _ => 1.0,
    }
}
