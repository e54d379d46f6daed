//! Per-ticker fan-out of adjustment work.
//!
//! Each ticker is one independent task on a bounded pool. A task returns its
//! own result value, so one rejected ticker leaves the rest of the batch
//! intact. With a budget set, tickers still running when it expires are
//! recorded as [`SeriesEntry::BudgetExceeded`] and their work is discarded.
//!
//! Dropping the future returned by [`adjust_batch`] cancels every task that
//! has not started; nothing is shared or mutated, so no cleanup is needed.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use cbt_adjust::{recompute_bars, AdjustedSeries};
use cbt_md::{InvalidInput, PriceBar};

use crate::engine::SeriesSource;
use crate::types::UndeterminedReason;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Upper bound on concurrently running tickers. `0` is treated as `1`.
    pub max_workers: usize,
    /// Wall-clock budget for the whole batch.
    pub budget: Option<Duration>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            budget: None,
        }
    }
}

/// Outcome of adjusting one ticker.
#[derive(Clone, Debug, PartialEq)]
pub enum SeriesEntry {
    Adjusted(AdjustedSeries),
    Rejected(InvalidInput),
    BudgetExceeded,
    /// The worker died before producing a result.
    Aborted(String),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchReport {
    pub entries: BTreeMap<String, SeriesEntry>,
}

impl BatchReport {
    pub fn adjusted(&self) -> impl Iterator<Item = &AdjustedSeries> {
        self.entries.values().filter_map(|e| match e {
            SeriesEntry::Adjusted(s) => Some(s),
            _ => None,
        })
    }

    pub fn rejected(&self) -> impl Iterator<Item = &InvalidInput> {
        self.entries.values().filter_map(|e| match e {
            SeriesEntry::Rejected(err) => Some(err),
            _ => None,
        })
    }

    pub fn count_budget_exceeded(&self) -> usize {
        self.entries
            .values()
            .filter(|e| matches!(e, SeriesEntry::BudgetExceeded))
            .count()
    }
}

impl SeriesSource for BatchReport {
    fn lookup(&self, ticker: &str) -> Result<&AdjustedSeries, UndeterminedReason> {
        match self.entries.get(ticker) {
            Some(SeriesEntry::Adjusted(s)) => Ok(s),
            Some(SeriesEntry::Rejected(_)) | Some(SeriesEntry::Aborted(_)) => {
                Err(UndeterminedReason::TickerRejected)
            }
            Some(SeriesEntry::BudgetExceeded) => Err(UndeterminedReason::BudgetExceeded),
            None => Err(UndeterminedReason::MissingSeries),
        }
    }

    fn latest_date(&self) -> Option<NaiveDate> {
        self.adjusted().filter_map(AdjustedSeries::last_date).max()
    }

    fn tickers(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

/// Validate and adjust every ticker in `raw` on a bounded worker pool.
///
/// Must be called from within a Tokio runtime.
pub async fn adjust_batch(raw: BTreeMap<String, Vec<PriceBar>>, cfg: &BatchConfig) -> BatchReport {
    let tickers: Vec<String> = raw.keys().cloned().collect();
    let permits = Arc::new(Semaphore::new(cfg.max_workers.max(1)));
    let mut set: JoinSet<(String, SeriesEntry)> = JoinSet::new();

    for (ticker, bars) in raw {
        let permits = Arc::clone(&permits);
        set.spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(p) => p,
                Err(_) => return (ticker, SeriesEntry::Aborted("worker pool closed".to_string())),
            };

            let t = ticker.clone();
            let entry = match tokio::task::spawn_blocking(move || recompute_bars(&t, &bars)).await {
                Ok(Ok(series)) => SeriesEntry::Adjusted(series),
                Ok(Err(e)) => SeriesEntry::Rejected(e),
                Err(e) => SeriesEntry::Aborted(e.to_string()),
            };
            (ticker, entry)
        });
    }

    let mut entries: BTreeMap<String, SeriesEntry> = BTreeMap::new();
    let collect = async {
        while let Some(joined) = set.join_next().await {
            record(&mut entries, joined);
        }
    };

    let timed_out = match cfg.budget {
        Some(budget) => tokio::time::timeout(budget, collect).await.is_err(),
        None => {
            collect.await;
            false
        }
    };
    // Tasks that finished while the budget expired keep their result.
    while let Some(joined) = set.try_join_next() {
        record(&mut entries, joined);
    }
    set.abort_all();

    for ticker in tickers {
        entries.entry(ticker).or_insert_with(|| {
            if timed_out {
                SeriesEntry::BudgetExceeded
            } else {
                SeriesEntry::Aborted("task did not report".to_string())
            }
        });
    }

    let report = BatchReport { entries };
    info!(
        tickers = report.entries.len(),
        adjusted = report.adjusted().count(),
        rejected = report.rejected().count(),
        budget_exceeded = report.count_budget_exceeded(),
        "adjust batch complete"
    );
    report
}

fn record(
    entries: &mut BTreeMap<String, SeriesEntry>,
    joined: Result<(String, SeriesEntry), tokio::task::JoinError>,
) {
    match joined {
        Ok((ticker, entry)) => {
            if let SeriesEntry::Rejected(e) = &entry {
                warn!(ticker = %ticker, error = %e, "ticker rejected");
            }
            entries.insert(ticker, entry);
        }
        Err(e) => warn!(error = %e, "adjust task failed"),
    }
}
