use crate::ConfigMode;

/// JSON-pointer prefixes each command actually reads.
///
/// Keep this in step with `BacktestSettings::from_config_json` and the CLI;
/// only list pointers the command really consumes.
pub fn consumed_pointers_for_mode(mode: ConfigMode) -> &'static [&'static str] {
    match mode {
        // cbt adjust: batch fan-out only
        ConfigMode::Adjust => &["/batch/max_workers", "/batch/budget_ms"],

        ConfigMode::Backtest => &[
            "/backtest/windows",
            "/backtest/catalyst_filter",
            "/backtest/lookback_days",
            "/backtest/as_of",
            "/batch/max_workers",
            "/batch/budget_ms",
        ],
    }
}
