//! `cbt backtest`: adjust prices, then aggregate forward returns after events.
//!
//! Precedence for every parameter: explicit flag, then config layers, then
//! built-in defaults.

use anyhow::{Context, Result};
use cbt_backtest::{adjust_batch, run_backtest, run_backtest_per_ticker, BacktestRequest};
use cbt_config::{BacktestSettings, ConfigMode};
use chrono::NaiveDate;
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

use super::{batch_config, load_prices, print_json, resolve_settings};

pub struct BacktestArgs {
    pub prices: String,
    pub events: String,
    pub config_paths: Vec<String>,
    pub strict_config: bool,
    pub windows: Vec<u32>,
    pub catalyst: Option<String>,
    pub lookback_days: Option<u32>,
    pub as_of: Option<NaiveDate>,
    pub per_ticker: bool,
}

#[derive(Serialize)]
struct BacktestOutput<'a, T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    config_hash: Option<&'a str>,
    #[serde(flatten)]
    result: T,
}

#[derive(Serialize)]
struct PerTicker<T: Serialize> {
    per_ticker: T,
}

pub async fn run(args: BacktestArgs) -> Result<()> {
    let resolved = resolve_settings(&args.config_paths, ConfigMode::Backtest, args.strict_config)?;
    let request = build_request(&args, &resolved.settings);

    let raw = load_prices(&args.prices)?;
    let events = cbt_md::parse_events_file(Path::new(&args.events))
        .with_context(|| format!("read events csv failed: {}", args.events))?;
    info!(events = events.len(), "events loaded");

    let report = adjust_batch(raw, &batch_config(&resolved.settings)).await;
    let skipped = report.entries.len() - report.adjusted().count();
    if skipped > 0 {
        warn!(skipped, "tickers without an adjusted series; their events are undetermined");
    }

    let config_hash = resolved.config_hash.as_deref();
    if args.per_ticker {
        let results = run_backtest_per_ticker(&report, &events, &request)?;
        print_json(&BacktestOutput {
            config_hash,
            result: PerTicker {
                per_ticker: results,
            },
        })
    } else {
        let result = run_backtest(&report, &events, &request)?;
        print_json(&BacktestOutput {
            config_hash,
            result,
        })
    }
}

fn build_request(args: &BacktestArgs, settings: &BacktestSettings) -> BacktestRequest {
    let windows = if args.windows.is_empty() {
        settings.windows.clone()
    } else {
        args.windows.clone()
    };

    BacktestRequest {
        windows,
        catalyst_filter: args
            .catalyst
            .clone()
            .or_else(|| settings.catalyst_filter.clone()),
        lookback_days: args.lookback_days.or(settings.lookback_days),
        as_of: args.as_of.or(settings.as_of),
    }
}
