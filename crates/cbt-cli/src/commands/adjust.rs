//! `cbt adjust`: validate and adjust every ticker, print the adjusted series.

use anyhow::{bail, Context, Result};
use cbt_adjust::AdjustedSeries;
use cbt_backtest::{adjust_batch, BatchReport, SeriesEntry};
use cbt_config::ConfigMode;
use chrono::NaiveDate;
use clap::ValueEnum;
use serde::Serialize;
use tracing::info;

use super::{batch_config, load_prices, print_json, resolve_settings};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
}

pub struct AdjustArgs {
    pub prices: String,
    pub ticker: Option<String>,
    pub format: OutputFormat,
    pub config_paths: Vec<String>,
    pub strict_config: bool,
}

#[derive(Serialize)]
struct RejectedTicker {
    ticker: String,
    reason: String,
}

#[derive(Serialize)]
struct AdjustOutput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    config_hash: Option<&'a str>,
    series: Vec<&'a AdjustedSeries>,
    rejected: Vec<RejectedTicker>,
}

#[derive(Serialize)]
struct CsvRow<'a> {
    ticker: &'a str,
    date: NaiveDate,
    close: f64,
    dividend: f64,
    split_coefficient: f64,
    adj_close: f64,
}

pub async fn run(args: AdjustArgs) -> Result<()> {
    let resolved = resolve_settings(&args.config_paths, ConfigMode::Adjust, args.strict_config)?;

    let mut raw = load_prices(&args.prices)?;
    if let Some(t) = &args.ticker {
        raw.retain(|k, _| k == t);
        if raw.is_empty() {
            bail!("ticker '{}' not found in {}", t, args.prices);
        }
    }

    let report = adjust_batch(raw, &batch_config(&resolved.settings)).await;
    info!(
        adjusted = report.adjusted().count(),
        rejected = report.entries.len() - report.adjusted().count(),
        "adjust complete"
    );

    match args.format {
        OutputFormat::Json => {
            let out = AdjustOutput {
                config_hash: resolved.config_hash.as_deref(),
                series: report.adjusted().collect(),
                rejected: rejected_tickers(&report),
            };
            print_json(&out)
        }
        OutputFormat::Csv => write_csv(&report),
    }
}

fn rejected_tickers(report: &BatchReport) -> Vec<RejectedTicker> {
    report
        .entries
        .iter()
        .filter_map(|(ticker, entry)| {
            let reason = match entry {
                SeriesEntry::Adjusted(_) => return None,
                SeriesEntry::Rejected(err) => err.to_string(),
                SeriesEntry::BudgetExceeded => "budget_exceeded".to_string(),
                SeriesEntry::Aborted(msg) => format!("aborted: {msg}"),
            };
            Some(RejectedTicker {
                ticker: ticker.clone(),
                reason,
            })
        })
        .collect()
}

fn write_csv(report: &BatchReport) -> Result<()> {
    let mut w = csv::Writer::from_writer(std::io::stdout().lock());
    for series in report.adjusted() {
        for bar in series.bars() {
            w.serialize(CsvRow {
                ticker: series.ticker(),
                date: bar.date,
                close: bar.close,
                dividend: bar.dividend,
                split_coefficient: bar.split_coefficient,
                adj_close: bar.adj_close,
            })
            .context("write csv row failed")?;
        }
    }
    w.flush().context("flush csv output failed")?;
    Ok(())
}
