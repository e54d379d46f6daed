//! Unused config keys: warn or fail.
//!
//! GREEN when:
//! - Warn reports typos and stray sections without erroring
//! - Fail refuses them with CONFIG_UNUSED_KEYS naming the pointer
//! - backtest keys count as unused for `cbt adjust`
//! - pointers come back sorted

use cbt_config::{load_layered_yaml_from_strings, report_unused_keys, ConfigMode, UnusedKeyPolicy};

#[test]
fn warn_mode_reports_unused_keys_without_error() {
    let yaml = r#"
backtest:
  windows: [1, 5]
  window: [2]

unused_section:
  foo: 123
  bar: 456
"#;

    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();

    let report = report_unused_keys(
        ConfigMode::Backtest,
        &loaded.config_json,
        UnusedKeyPolicy::Warn,
    )
    .unwrap();

    assert!(!report.is_clean());
    assert_eq!(
        report.unused_leaf_pointers,
        vec![
            "/backtest/window/0".to_string(),
            "/unused_section/bar".to_string(),
            "/unused_section/foo".to_string(),
        ]
    );
}

#[test]
fn fail_mode_errors_on_unused_keys() {
    let yaml = r#"
batch:
  max_workers: 2
  retries: 3
"#;

    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
    let result = report_unused_keys(ConfigMode::Adjust, &loaded.config_json, UnusedKeyPolicy::Fail);

    let msg = format!("{:?}", result.err().expect("fail policy must error"));
    assert!(msg.contains("CONFIG_UNUSED_KEYS"));
    assert!(msg.contains("/batch/retries"));
}

#[test]
fn backtest_section_is_unused_when_adjusting() {
    let yaml = r#"
backtest:
  windows: [1]
batch:
  budget_ms: 100
"#;

    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();

    let adjust = report_unused_keys(ConfigMode::Adjust, &loaded.config_json, UnusedKeyPolicy::Warn)
        .unwrap();
    assert_eq!(adjust.unused_leaf_pointers, vec!["/backtest/windows/0".to_string()]);

    let backtest = report_unused_keys(
        ConfigMode::Backtest,
        &loaded.config_json,
        UnusedKeyPolicy::Fail,
    )
    .expect("every key is read by backtest");
    assert!(backtest.is_clean());
}

#[test]
fn deterministic_unused_pointer_ordering() {
    let yaml = r#"
unused:
  b: 2
  a: 1
"#;

    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();

    let report = report_unused_keys(
        ConfigMode::Backtest,
        &loaded.config_json,
        UnusedKeyPolicy::Warn,
    )
    .unwrap();

    assert_eq!(
        report.unused_leaf_pointers,
        vec!["/unused/a".to_string(), "/unused/b".to_string()]
    );
}
