//! cbt-backtest
//!
//! Event-window backtests over adjusted daily series.
//!
//! Pipeline: ADJUSTED SERIES -> FORWARD RETURN (per event, per window) -> WINDOW STATS
//!
//! - No look-ahead: measurement starts on the first bar on or after the event
//! - Undetermined outcomes are explicit and never counted as zero
//! - Statistics are re-derivable from the retained samples
//! - Per-ticker adjustment fans out on a bounded pool (`batch`)

pub mod batch;
mod engine;
pub mod forward;
pub mod stats;
pub mod types;

pub use batch::{adjust_batch, BatchConfig, BatchReport, SeriesEntry};
pub use engine::{run_backtest, run_backtest_per_ticker, sample_event, SeriesSource};
pub use forward::compute_return;
pub use stats::compute_window_stats;
pub use types::{
    BacktestError, BacktestRequest, BacktestResult, EventSample, Scope, UndeterminedReason,
    WindowOutcome, WindowStats,
};
