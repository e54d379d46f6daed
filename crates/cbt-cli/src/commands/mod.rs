//! Command handler modules for the `cbt` binary.
//!
//! Shared utilities used by multiple command paths live here.
//! Command-specific logic lives in the submodules.

pub mod adjust;
pub mod backtest;
pub mod inspect;

use anyhow::{Context, Result};
use cbt_backtest::BatchConfig;
use cbt_config::{BacktestSettings, ConfigMode, UnusedKeyPolicy};
use cbt_md::PriceBar;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Settings after config layering, plus the hash of the layers used.
pub struct ResolvedSettings {
    pub settings: BacktestSettings,
    pub config_hash: Option<String>,
}

/// Load layered config for `mode`. No paths means built-in defaults.
pub fn resolve_settings(
    config_paths: &[String],
    mode: ConfigMode,
    strict: bool,
) -> Result<ResolvedSettings> {
    if config_paths.is_empty() {
        return Ok(ResolvedSettings {
            settings: BacktestSettings::default(),
            config_hash: None,
        });
    }

    let path_refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
    let loaded = cbt_config::load_layered_yaml(&path_refs)?;

    let policy = if strict {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let report = cbt_config::report_unused_keys(mode, &loaded.config_json, policy)?;
    for pointer in &report.unused_leaf_pointers {
        warn!(mode = report.mode.as_str(), pointer = %pointer, "unused config key");
    }

    let settings = BacktestSettings::for_mode(&loaded.config_json, mode)?;
    info!(config_hash = %loaded.config_hash, "config loaded");

    Ok(ResolvedSettings {
        settings,
        config_hash: Some(loaded.config_hash),
    })
}

pub fn batch_config(settings: &BacktestSettings) -> BatchConfig {
    BatchConfig {
        max_workers: settings.max_workers,
        budget: settings.budget_ms.map(Duration::from_millis),
    }
}

pub fn load_prices(path: &str) -> Result<BTreeMap<String, Vec<PriceBar>>> {
    let raw = cbt_md::parse_prices_file(Path::new(path))
        .with_context(|| format!("read prices csv failed: {path}"))?;
    info!(path, tickers = raw.len(), "prices loaded");
    Ok(raw)
}

/// Pretty JSON to stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serialize output json failed")?;
    println!("{json}");
    Ok(())
}
