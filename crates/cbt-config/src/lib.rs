//! cbt-config
//!
//! Layered YAML configuration: documents are merged in order (later wins),
//! converted to JSON, serialized canonically and hashed. The hash identifies
//! the exact parameter set behind a backtest result.
//!
//! Typed settings are read from the merged JSON by [`BacktestSettings`].
//! Keys the active command never reads can be reported or refused with
//! [`report_unused_keys`].

mod consumption;
mod layering;
mod settings;
mod unused_keys;

pub use consumption::consumed_pointers_for_mode;
pub use layering::{load_layered_yaml, load_layered_yaml_from_strings, LoadedConfig};
pub use settings::{BacktestSettings, DEFAULT_MAX_WORKERS, DEFAULT_WINDOWS};
pub use unused_keys::{report_unused_keys, UnusedKeyPolicy, UnusedKeyReport};

/// Which command is reading the config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigMode {
    Adjust,
    Backtest,
}

impl ConfigMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigMode::Adjust => "ADJUST",
            ConfigMode::Backtest => "BACKTEST",
        }
    }
}
