use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

/// Why a (event, window) pair has no return.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UndeterminedReason {
    /// No bar on or after the event date.
    EventAfterLastBar,
    /// The start bar exists but the series ends before the window does.
    WindowBeyondSeries,
    /// Start adjusted close is zero or not finite.
    DegenerateStartPrice,
    /// No series was supplied for the event's ticker.
    MissingSeries,
    /// The ticker's raw series failed validation.
    TickerRejected,
    /// The ticker did not finish within the batch budget.
    BudgetExceeded,
}

impl UndeterminedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            UndeterminedReason::EventAfterLastBar => "event_after_last_bar",
            UndeterminedReason::WindowBeyondSeries => "window_beyond_series",
            UndeterminedReason::DegenerateStartPrice => "degenerate_start_price",
            UndeterminedReason::MissingSeries => "missing_series",
            UndeterminedReason::TickerRejected => "ticker_rejected",
            UndeterminedReason::BudgetExceeded => "budget_exceeded",
        }
    }
}

impl fmt::Display for UndeterminedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Forward return for one window: a percent, or undetermined with a reason.
///
/// No conversion to a bare `f64` exists; missing data is never a zero return.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum WindowOutcome {
    Defined(f64),
    Undetermined(UndeterminedReason),
}

impl WindowOutcome {
    pub fn percent(&self) -> Option<f64> {
        match self {
            WindowOutcome::Defined(p) => Some(*p),
            WindowOutcome::Undetermined(_) => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, WindowOutcome::Defined(_))
    }
}

/// One event and its outcome for every requested window.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EventSample {
    pub ticker: String,
    pub event_date: NaiveDate,
    pub catalyst: String,
    pub returns: BTreeMap<u32, WindowOutcome>,
}

impl EventSample {
    /// Defined percent for `window`, if any.
    pub fn return_for(&self, window: u32) -> Option<f64> {
        self.returns.get(&window).and_then(WindowOutcome::percent)
    }
}

/// Summary of defined returns for one window length.
///
/// Statistics are `None` when their input subset is empty.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WindowStats {
    pub window: u32,
    pub sample_count: usize,
    pub mean_percent: Option<f64>,
    pub median_percent: Option<f64>,
    pub win_rate_percent: Option<f64>,
    pub mean_positive_percent: Option<f64>,
    pub mean_negative_percent: Option<f64>,
}

/// What a result was aggregated over.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", content = "ticker", rename_all = "snake_case")]
pub enum Scope {
    Ticker(String),
    Combined,
}

/// Caller-supplied backtest parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BacktestRequest {
    /// Window lengths in trading days. Must be non-empty; duplicates collapse.
    pub windows: Vec<u32>,
    /// Keep only events whose catalyst equals this label.
    pub catalyst_filter: Option<String>,
    /// Keep only events within this many calendar days before `as_of`.
    pub lookback_days: Option<u32>,
    /// Reference date for `lookback_days`. Defaults to the latest bar date
    /// across the supplied series.
    pub as_of: Option<NaiveDate>,
}

impl BacktestRequest {
    pub fn new(windows: Vec<u32>) -> Self {
        Self {
            windows,
            catalyst_filter: None,
            lookback_days: None,
            as_of: None,
        }
    }

    pub fn with_catalyst(mut self, catalyst: impl Into<String>) -> Self {
        self.catalyst_filter = Some(catalyst.into());
        self
    }

    pub fn with_lookback(mut self, days: u32, as_of: Option<NaiveDate>) -> Self {
        self.lookback_days = Some(days);
        self.as_of = as_of;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BacktestResult {
    pub scope: Scope,
    pub catalyst_filter: Option<String>,
    pub lookback_days: Option<u32>,
    /// Resolved reference date when a lookback was applied.
    pub as_of: Option<NaiveDate>,
    /// Sorted, de-duplicated window lengths.
    pub windows: Vec<u32>,
    pub window_stats: BTreeMap<u32, WindowStats>,
    /// Ordered by event date, then ticker, then input order.
    pub samples: Vec<EventSample>,
}

/// Request-level misuse.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BacktestError {
    /// No window lengths were requested.
    EmptyWindows,
}

impl fmt::Display for BacktestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BacktestError::EmptyWindows => write!(f, "at least one window length is required"),
        }
    }
}

impl std::error::Error for BacktestError {}
