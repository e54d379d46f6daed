//! Detect config leaves no command reads (typos, stale keys).

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

use crate::consumption::consumed_pointers_for_mode;
use crate::ConfigMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    pub mode: String,
    /// Sorted, unique.
    pub consumed_prefixes: Vec<String>,
    /// Sorted, unique leaf pointers outside every consumed prefix.
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// Compare the leaves of `config_json` against what `mode` consumes.
///
/// With [`UnusedKeyPolicy::Fail`] any unused leaf is an error whose message
/// starts with `CONFIG_UNUSED_KEYS`.
pub fn report_unused_keys(
    mode: ConfigMode,
    config_json: &Value,
    policy: UnusedKeyPolicy,
) -> Result<UnusedKeyReport> {
    let consumed: BTreeSet<String> = consumed_pointers_for_mode(mode)
        .iter()
        .map(|p| canonical_pointer(p))
        .collect();

    let mut leaves = BTreeSet::new();
    walk_leaves(config_json, String::new(), &mut leaves);

    let unused: Vec<String> = leaves
        .into_iter()
        .filter(|leaf| !consumed.iter().any(|prefix| covers(prefix, leaf)))
        .collect();

    let report = UnusedKeyReport {
        mode: mode.as_str().to_string(),
        consumed_prefixes: consumed.into_iter().collect(),
        unused_leaf_pointers: unused,
    };

    if policy == UnusedKeyPolicy::Fail && !report.is_clean() {
        let shown: Vec<&String> = report.unused_leaf_pointers.iter().take(12).collect();
        bail!(
            "CONFIG_UNUSED_KEYS (mode={}): {} key(s) not read by this command: {:?}",
            report.mode,
            report.unused_leaf_pointers.len(),
            shown
        );
    }

    Ok(report)
}

/// Leading slash, no trailing slash; empty means the root.
fn canonical_pointer(p: &str) -> String {
    let body = p.trim().trim_matches('/');
    format!("/{body}")
}

/// `/a/b` covers `/a/b` and `/a/b/c`, not `/a/bc`.
fn covers(prefix: &str, leaf: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    match leaf.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Scalars, nulls and empty containers below the root are leaves.
fn walk_leaves(v: &Value, path: String, out: &mut BTreeSet<String>) {
    let children: Vec<(String, &Value)> = match v {
        Value::Object(map) => map
            .iter()
            .map(|(k, child)| (k.replace('~', "~0").replace('/', "~1"), child))
            .collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, child)| (i.to_string(), child))
            .collect(),
        _ => Vec::new(),
    };

    if children.is_empty() {
        match (path.is_empty(), v.is_object()) {
            // empty document
            (true, true) => {}
            (true, false) => {
                out.insert("/".to_string());
            }
            (false, _) => {
                out.insert(path);
            }
        }
        return;
    }
    for (token, child) in children {
        walk_leaves(child, format!("{path}/{token}"), out);
    }
}
