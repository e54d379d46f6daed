//! `cbt inspect`: data-quality report per ticker, validation status included.

use anyhow::Result;
use cbt_adjust::AdjustmentFactor;
use cbt_md::{build_quality_report, PriceSeries, QualityReport};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

use super::{load_prices, print_json};

#[derive(Serialize)]
struct InspectEntry {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    report: QualityReport,
    /// Bars re-priced by a later corporate action (multiplier != 1).
    adjusted_bars: Vec<AdjustmentFactor>,
}

pub fn run(prices: &str) -> Result<()> {
    let raw = load_prices(prices)?;

    let mut out: BTreeMap<String, InspectEntry> = BTreeMap::new();
    for (ticker, bars) in raw {
        let report = build_quality_report(&bars);
        if !report.is_clean() {
            warn!(ticker = %ticker, "{}", report);
        }

        let entry = match PriceSeries::new(ticker.clone(), bars) {
            Ok(series) => InspectEntry {
                valid: true,
                error: None,
                report,
                adjusted_bars: cbt_adjust::factors(&series)
                    .into_iter()
                    .filter(|f| f.multiplier != 1.0)
                    .collect(),
            },
            Err(e) => {
                warn!(ticker = %ticker, error = %e, "invalid series");
                InspectEntry {
                    valid: false,
                    error: Some(e.to_string()),
                    report,
                    adjusted_bars: Vec::new(),
                }
            }
        };
        out.insert(ticker, entry);
    }

    print_json(&out)
}
