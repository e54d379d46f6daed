//! Published WindowStats must be reproducible from `samples` alone.
//!
//! The check below recomputes every statistic with its own loop, without
//! calling into the crate's reducer, and requires exact equality.

use std::collections::BTreeMap;

use cbt_adjust::{recompute, AdjustedSeries};
use cbt_backtest::{run_backtest, run_backtest_per_ticker, BacktestRequest, BacktestResult, Scope};
use cbt_md::{Event, PriceBar, PriceSeries};
use chrono::NaiveDate;

fn d(m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, day).unwrap()
}

fn series(ticker: &str, start_px: f64, drift: &[f64], split_at: Option<usize>) -> AdjustedSeries {
    let mut px = start_px;
    let mut bars = Vec::new();
    let mut date = d(2, 1);
    for (i, step) in drift.iter().enumerate() {
        px *= 1.0 + step;
        let mut bar = PriceBar::new(date, px);
        if split_at == Some(i) {
            px /= 2.0;
            bar = PriceBar::new(date, px).with_split(2.0);
        }
        if i % 7 == 3 {
            bar = bar.with_dividend(0.11);
        }
        bars.push(bar);
        date = date.succ_opt().unwrap();
    }
    recompute(&PriceSeries::new(ticker, bars).unwrap())
}

fn book() -> BTreeMap<String, AdjustedSeries> {
    let a = [0.01, -0.02, 0.0, 0.03, 0.015, -0.01, 0.02, -0.03, 0.0, 0.01, 0.04, -0.02];
    let b = [-0.01, 0.02, 0.02, -0.04, 0.0, 0.01, -0.005, 0.03, 0.01, -0.02];
    [
        ("AAA".to_string(), series("AAA", 50.0, &a, Some(5))),
        ("BBB".to_string(), series("BBB", 12.0, &b, None)),
    ]
    .into_iter()
    .collect()
}

fn events() -> Vec<Event> {
    vec![
        Event::new("BBB", d(2, 9), "beat"),
        Event::new("AAA", d(2, 2), "beat"),
        Event::new("AAA", d(2, 4), "miss"),
        Event::new("BBB", d(2, 2), "beat"),
        Event::new("AAA", d(2, 10), "beat"),
        Event::new("AAA", d(2, 12), "beat"),
        Event::new("AAA", d(3, 30), "beat"),
        Event::new("CCC", d(2, 3), "beat"),
    ]
}

fn assert_rederivable(result: &BacktestResult) {
    for w in &result.windows {
        let mut values = Vec::new();
        for s in &result.samples {
            if let Some(v) = s.returns.get(w).and_then(|o| o.percent()) {
                values.push(v);
            }
        }

        let stats = &result.window_stats[w];
        assert_eq!(stats.window, *w);
        assert_eq!(stats.sample_count, values.len(), "window {w}");

        if values.is_empty() {
            assert_eq!(stats.mean_percent, None);
            assert_eq!(stats.median_percent, None);
            assert_eq!(stats.win_rate_percent, None);
            continue;
        }

        let mut sum = 0.0;
        let mut wins = 0usize;
        for v in &values {
            sum += v;
            if *v > 0.0 {
                wins += 1;
            }
        }
        let mean = sum / values.len() as f64;

        let mut sorted = values.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let n = sorted.len();
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };

        assert_eq!(stats.mean_percent, Some(mean), "mean, window {w}");
        assert_eq!(stats.median_percent, Some(median), "median, window {w}");
        assert_eq!(
            stats.win_rate_percent,
            Some(100.0 * wins as f64 / n as f64),
            "win rate, window {w}"
        );
    }
}

#[test]
fn combined_stats_match_independent_pass() {
    let req = BacktestRequest::new(vec![1, 3, 5]);
    let r = run_backtest(&book(), &events(), &req).unwrap();

    assert_eq!(r.scope, Scope::Combined);
    assert_eq!(r.samples.len(), 8);
    assert_rederivable(&r);
}

#[test]
fn per_ticker_stats_match_independent_pass() {
    let req = BacktestRequest::new(vec![1, 3, 5]).with_catalyst("beat");
    let m = run_backtest_per_ticker(&book(), &events(), &req).unwrap();

    assert_eq!(m.len(), 3);
    for r in m.values() {
        assert!(r.samples.iter().all(|s| s.catalyst == "beat"));
        assert_rederivable(r);
    }
}

#[test]
fn samples_are_chronological() {
    let r = run_backtest(&book(), &events(), &BacktestRequest::new(vec![1])).unwrap();

    let keys: Vec<(NaiveDate, String)> = r
        .samples
        .iter()
        .map(|s| (s.event_date, s.ticker.clone()))
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
    assert_eq!(keys[0], (d(2, 2), "AAA".to_string()));
    assert_eq!(keys[1], (d(2, 2), "BBB".to_string()));
}

#[test]
fn result_serializes_outcomes_with_status() {
    let r = run_backtest(&book(), &events(), &BacktestRequest::new(vec![1])).unwrap();
    let v = serde_json::to_value(&r).unwrap();

    assert_eq!(v["scope"]["kind"], "combined");
    let last = &v["samples"][7];
    assert_eq!(last["ticker"], "AAA");
    assert_eq!(last["returns"]["1"]["status"], "undetermined");
    assert_eq!(last["returns"]["1"]["value"], "event_after_last_bar");

    let first = &v["samples"][0];
    assert_eq!(first["returns"]["1"]["status"], "defined");
    assert!(first["returns"]["1"]["value"].is_f64());
}
