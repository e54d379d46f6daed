//! Forward return over a fixed number of trading days.
//!
//! The start bar is the first bar dated on or after the event, never before
//! it. The end bar is `window` bars later, counted in bars present in the
//! series, so non-trading days are skipped implicitly. Nothing is
//! extrapolated: if either bar is missing the outcome is undetermined.

use chrono::NaiveDate;

use cbt_adjust::AdjustedSeries;

use crate::types::{UndeterminedReason, WindowOutcome};

/// Percent return `(end / start - 1) * 100` on adjusted closes. Unrounded.
pub fn compute_return(series: &AdjustedSeries, event_date: NaiveDate, window: u32) -> WindowOutcome {
    let start = match series.first_index_on_or_after(event_date) {
        Some(i) => i,
        None => return WindowOutcome::Undetermined(UndeterminedReason::EventAfterLastBar),
    };

    let end = match start.checked_add(window as usize) {
        Some(e) if e < series.len() => e,
        _ => return WindowOutcome::Undetermined(UndeterminedReason::WindowBeyondSeries),
    };

    if window == 0 {
        return WindowOutcome::Defined(0.0);
    }

    let start_px = series.bars()[start].adj_close;
    if start_px == 0.0 || !start_px.is_finite() {
        return WindowOutcome::Undetermined(UndeterminedReason::DegenerateStartPrice);
    }
    let end_px = series.bars()[end].adj_close;

    WindowOutcome::Defined((end_px / start_px - 1.0) * 100.0)
}
