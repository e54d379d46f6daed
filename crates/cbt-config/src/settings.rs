use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ConfigMode;

/// Window lengths used when neither config nor CLI provide any.
pub const DEFAULT_WINDOWS: &[u32] = &[1, 3, 5];
pub const DEFAULT_MAX_WORKERS: usize = 4;

/// Config shape read by the commands. Unknown keys are ignored here and
/// surfaced by `report_unused_keys` instead.
#[derive(Debug, Default, Deserialize)]
struct ConfigDoc {
    /// Kept raw: only `cbt backtest` reads it.
    #[serde(default)]
    backtest: Value,
    #[serde(default)]
    batch: BatchSection,
}

#[derive(Debug, Default, Deserialize)]
struct BacktestSection {
    windows: Option<Vec<u32>>,
    catalyst_filter: Option<String>,
    lookback_days: Option<u32>,
    as_of: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
struct BatchSection {
    max_workers: Option<usize>,
    budget_ms: Option<u64>,
}

/// Settings read by `cbt adjust` / `cbt backtest`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BacktestSettings {
    pub windows: Vec<u32>,
    pub catalyst_filter: Option<String>,
    pub lookback_days: Option<u32>,
    pub as_of: Option<NaiveDate>,
    pub max_workers: usize,
    pub budget_ms: Option<u64>,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            windows: DEFAULT_WINDOWS.to_vec(),
            catalyst_filter: None,
            lookback_days: None,
            as_of: None,
            max_workers: DEFAULT_MAX_WORKERS,
            budget_ms: None,
        }
    }
}

impl BacktestSettings {
    /// Settings as read by `cbt backtest`.
    pub fn from_config_json(config_json: &Value) -> Result<Self> {
        Self::for_mode(config_json, ConfigMode::Backtest)
    }

    /// Settings as read by `mode`. Sections the mode never reads are neither
    /// parsed nor validated, and their fields keep the defaults.
    pub fn for_mode(config_json: &Value, mode: ConfigMode) -> Result<Self> {
        let doc = ConfigDoc::deserialize(config_json)
            .context("config does not match backtest/batch schema")?;

        let section = match mode {
            ConfigMode::Backtest if !doc.backtest.is_null() => {
                BacktestSection::deserialize(&doc.backtest)
                    .context("config does not match backtest schema")?
            }
            _ => BacktestSection::default(),
        };
        let BacktestSection {
            windows,
            catalyst_filter,
            lookback_days,
            as_of,
        } = section;

        let windows = windows.unwrap_or_else(|| DEFAULT_WINDOWS.to_vec());
        if windows.is_empty() {
            bail!("CONFIG_INVALID: /backtest/windows must not be empty");
        }
        let max_workers = doc.batch.max_workers.unwrap_or(DEFAULT_MAX_WORKERS);
        if max_workers == 0 {
            bail!("CONFIG_INVALID: /batch/max_workers must be >= 1");
        }

        Ok(Self {
            windows,
            catalyst_filter,
            lookback_days,
            as_of,
            max_workers,
            budget_ms: doc.batch.budget_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sections_use_defaults() {
        let s = BacktestSettings::from_config_json(&serde_json::json!({})).unwrap();
        assert_eq!(s, BacktestSettings::default());
        assert_eq!(s.windows, vec![1, 3, 5]);
    }

    #[test]
    fn non_object_section_is_a_schema_error() {
        assert!(BacktestSettings::from_config_json(&serde_json::json!({"batch": "x"})).is_err());
        assert!(BacktestSettings::from_config_json(&serde_json::json!({"backtest": 3})).is_err());
    }

    #[test]
    fn adjust_mode_skips_backtest_section() {
        let json = serde_json::json!({"backtest": {"windows": []}, "batch": {"max_workers": 2}});
        let s = BacktestSettings::for_mode(&json, ConfigMode::Adjust).unwrap();
        assert_eq!(s.windows, DEFAULT_WINDOWS.to_vec());
        assert_eq!(s.max_workers, 2);
        assert!(BacktestSettings::for_mode(&json, ConfigMode::Backtest).is_err());
    }
}
