//! `cbt adjust` / `cbt inspect` against a file with one good and one bad ticker.
//!
//! GREEN when:
//! - JSON output carries the adjusted series and lists the rejected ticker
//! - CSV output has one row per adjusted bar and omits the rejected ticker
//! - --ticker for an unknown symbol fails
//! - adjust with a config reads only the batch section
//! - inspect marks the bad ticker invalid and still reports its bars

use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const PRICES: &str = "\
ticker,date,close,dividend,split_coefficient
WRK,2024-01-01,100.00,0,1
WRK,2024-01-02,101.00,0,1
WRK,2024-01-03,102.00,0,1
WRK,2024-01-04,103.00,0,1
WRK,2024-01-05,104.00,0,1
WRK,2024-01-06,103.00,1.00,1
WRK,2024-01-07,102.00,0,1
WRK,2024-01-08,101.00,0,1
WRK,2024-01-09,50.50,0,2
WRK,2024-01-10,51.00,0,1
BAD,2024-01-01,10.00,0,1
BAD,2024-01-02,10.00,0,0
";

fn write_prices(dir: &TempDir) -> PathBuf {
    let p = dir.path().join("prices.csv");
    fs::write(&p, PRICES).unwrap();
    p
}

#[allow(deprecated)]
fn cbt() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("cbt").unwrap();
    cmd.env("RUST_LOG", "warn");
    cmd
}

#[test]
fn adjust_json_lists_series_and_rejections() {
    let dir = TempDir::new().unwrap();
    let prices = write_prices(&dir);

    let out = cbt()
        .args(["adjust", "--prices", prices.to_str().unwrap()])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v: Value = serde_json::from_slice(&out).unwrap();

    let series = v["series"].as_array().unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0]["ticker"], "WRK");
    let first = series[0]["bars"][0]["adj_close"].as_f64().unwrap();
    assert!((first - 49.52).abs() <= 0.01, "got {first}");

    let rejected = v["rejected"].as_array().unwrap();
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0]["ticker"], "BAD");
    assert!(v.get("config_hash").is_none());
}

#[test]
fn adjust_csv_has_header_and_one_row_per_bar() {
    let dir = TempDir::new().unwrap();
    let prices = write_prices(&dir);

    let out = cbt()
        .args(["adjust", "--prices", prices.to_str().unwrap(), "--format", "csv"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], "ticker,date,close,dividend,split_coefficient,adj_close");
    assert_eq!(lines.len(), 11);
    assert!(lines[1..].iter().all(|l| l.starts_with("WRK,2024-01-")));
}

#[test]
fn adjust_unknown_ticker_fails() {
    let dir = TempDir::new().unwrap();
    let prices = write_prices(&dir);

    cbt()
        .args([
            "adjust",
            "--prices",
            prices.to_str().unwrap(),
            "--ticker",
            "NOPE",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn inspect_reports_every_ticker() {
    let dir = TempDir::new().unwrap();
    let prices = write_prices(&dir);

    let out = cbt()
        .args(["inspect", "--prices", prices.to_str().unwrap()])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v: Value = serde_json::from_slice(&out).unwrap();

    assert_eq!(v["WRK"]["valid"], true);
    assert_eq!(v["WRK"]["report"]["total_bars"], 10);
    assert_eq!(v["WRK"]["report"]["split_events"], 1);
    assert_eq!(v["WRK"]["report"]["dividend_events"], 1);
    // 01-01..01-08 sit before the split; 01-09 and 01-10 are untouched
    let touched = v["WRK"]["adjusted_bars"].as_array().unwrap();
    assert_eq!(touched.len(), 8);
    assert_eq!(touched[7]["date"], "2024-01-08");
    assert_eq!(touched[7]["multiplier"].as_f64().unwrap(), 0.5);

    assert_eq!(v["BAD"]["valid"], false);
    assert!(v["BAD"]["error"].as_str().unwrap().contains("BAD"));
    assert_eq!(v["BAD"]["report"]["total_bars"], 2);
    assert_eq!(v["BAD"]["adjusted_bars"], serde_json::json!([]));
}

#[test]
fn missing_prices_file_fails_with_context() {
    cbt()
        .args(["inspect", "--prices", "/definitely/not/here.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("read prices csv failed"));
}

#[test]
fn adjust_config_ignores_backtest_section() {
    let dir = TempDir::new().unwrap();
    let prices = write_prices(&dir);
    let cfg = dir.path().join("cbt.yaml");
    fs::write(&cfg, "backtest:\n  windows: []\nbatch:\n  max_workers: 1\n").unwrap();

    let out = cbt()
        .args([
            "adjust",
            "--prices",
            prices.to_str().unwrap(),
            "--config",
            cfg.to_str().unwrap(),
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(v["series"].as_array().unwrap().len(), 1);
    assert_eq!(v["config_hash"].as_str().unwrap().len(), 64);
}
