use std::collections::{BTreeMap, BTreeSet};

use chrono::{Days, NaiveDate};
use tracing::{debug, info};

use cbt_adjust::AdjustedSeries;
use cbt_md::Event;

use crate::forward::compute_return;
use crate::stats::compute_window_stats;
use crate::types::{
    BacktestError, BacktestRequest, BacktestResult, EventSample, Scope, UndeterminedReason,
    WindowOutcome,
};

/// Where the aggregator looks up adjusted series by ticker.
///
/// A ticker that cannot be served resolves to the reason every window of its
/// events will carry.
pub trait SeriesSource {
    fn lookup(&self, ticker: &str) -> Result<&AdjustedSeries, UndeterminedReason>;

    /// Latest bar date across all servable series.
    fn latest_date(&self) -> Option<NaiveDate>;

    /// Every ticker the source knows about, servable or not.
    fn tickers(&self) -> Vec<String>;
}

impl SeriesSource for BTreeMap<String, AdjustedSeries> {
    fn lookup(&self, ticker: &str) -> Result<&AdjustedSeries, UndeterminedReason> {
        self.get(ticker).ok_or(UndeterminedReason::MissingSeries)
    }

    fn latest_date(&self) -> Option<NaiveDate> {
        self.values().filter_map(AdjustedSeries::last_date).max()
    }

    fn tickers(&self) -> Vec<String> {
        self.keys().cloned().collect()
    }
}

/// Run a combined backtest over every event in `events`.
pub fn run_backtest<S: SeriesSource + ?Sized>(
    source: &S,
    events: &[Event],
    request: &BacktestRequest,
) -> Result<BacktestResult, BacktestError> {
    let windows = normalize_windows(&request.windows)?;
    let as_of = resolve_as_of(source, request);
    let selected = select_events(events, request, as_of);

    let result = aggregate(Scope::Combined, source, &selected, &windows, request, as_of);
    info!(
        events = events.len(),
        selected = selected.len(),
        windows = ?windows,
        "combined backtest complete"
    );
    Ok(result)
}

/// Run one backtest per ticker.
///
/// Tickers known to the source but without selected events get an empty
/// result, so callers can tell "no events" from "no series".
pub fn run_backtest_per_ticker<S: SeriesSource + ?Sized>(
    source: &S,
    events: &[Event],
    request: &BacktestRequest,
) -> Result<BTreeMap<String, BacktestResult>, BacktestError> {
    let windows = normalize_windows(&request.windows)?;
    let as_of = resolve_as_of(source, request);
    let selected = select_events(events, request, as_of);

    let mut by_ticker: BTreeMap<String, Vec<&Event>> = source
        .tickers()
        .into_iter()
        .map(|t| (t, Vec::new()))
        .collect();
    for ev in selected.iter().copied() {
        by_ticker.entry(ev.ticker.clone()).or_default().push(ev);
    }

    let out: BTreeMap<String, BacktestResult> = by_ticker
        .into_iter()
        .map(|(ticker, evs)| {
            let r = aggregate(
                Scope::Ticker(ticker.clone()),
                source,
                &evs,
                &windows,
                request,
                as_of,
            );
            (ticker, r)
        })
        .collect();

    info!(
        tickers = out.len(),
        selected = selected.len(),
        "per-ticker backtest complete"
    );
    Ok(out)
}

/// Evaluate every window for one event.
pub fn sample_event<S: SeriesSource + ?Sized>(source: &S, event: &Event, windows: &[u32]) -> EventSample {
    let returns = match source.lookup(&event.ticker) {
        Ok(series) => windows
            .iter()
            .map(|w| (*w, compute_return(series, event.event_date, *w)))
            .collect(),
        Err(reason) => windows
            .iter()
            .map(|w| (*w, WindowOutcome::Undetermined(reason)))
            .collect(),
    };

    EventSample {
        ticker: event.ticker.clone(),
        event_date: event.event_date,
        catalyst: event.catalyst.clone(),
        returns,
    }
}

fn aggregate<S: SeriesSource + ?Sized>(
    scope: Scope,
    source: &S,
    events: &[&Event],
    windows: &[u32],
    request: &BacktestRequest,
    as_of: Option<NaiveDate>,
) -> BacktestResult {
    let mut samples: Vec<EventSample> = events
        .iter()
        .map(|ev| sample_event(source, ev, windows))
        .collect();
    // stable: equal (date, ticker) keep input order
    samples.sort_by(|a, b| {
        a.event_date
            .cmp(&b.event_date)
            .then_with(|| a.ticker.cmp(&b.ticker))
    });

    let window_stats = compute_window_stats(windows, &samples);
    debug!(scope = ?scope, samples = samples.len(), "aggregated");

    BacktestResult {
        scope,
        catalyst_filter: request.catalyst_filter.clone(),
        lookback_days: request.lookback_days,
        as_of,
        windows: windows.to_vec(),
        window_stats,
        samples,
    }
}

fn normalize_windows(windows: &[u32]) -> Result<Vec<u32>, BacktestError> {
    let set: BTreeSet<u32> = windows.iter().copied().collect();
    if set.is_empty() {
        return Err(BacktestError::EmptyWindows);
    }
    Ok(set.into_iter().collect())
}

/// Reference date for the lookback filter; `None` when no lookback applies.
fn resolve_as_of<S: SeriesSource + ?Sized>(source: &S, request: &BacktestRequest) -> Option<NaiveDate> {
    request.lookback_days?;
    request.as_of.or_else(|| source.latest_date())
}

fn select_events<'a>(
    events: &'a [Event],
    request: &BacktestRequest,
    as_of: Option<NaiveDate>,
) -> Vec<&'a Event> {
    let window_start = match (request.lookback_days, as_of) {
        (Some(days), Some(as_of)) => Some((
            as_of
                .checked_sub_days(Days::new(u64::from(days)))
                .unwrap_or(NaiveDate::MIN),
            as_of,
        )),
        _ => None,
    };

    events
        .iter()
        .filter(|ev| match &request.catalyst_filter {
            Some(c) => &ev.catalyst == c,
            None => true,
        })
        .filter(|ev| match window_start {
            Some((from, to)) => ev.event_date >= from && ev.event_date <= to,
            None => true,
        })
        .collect()
}
