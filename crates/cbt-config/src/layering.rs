//! YAML layers -> one JSON document -> canonical text -> SHA-256.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Merged config plus the identity of the exact parameter set.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Lowercase hex SHA-256 of `canonical_json`.
    pub config_hash: String,
    /// Compact JSON with object keys sorted at every depth.
    pub canonical_json: String,
    pub config_json: Value,
}

/// Read and merge YAML files in order; later files win.
pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let docs = paths
        .iter()
        .map(|p| {
            fs::read_to_string(Path::new(p)).with_context(|| format!("failed to read yaml path: {p}"))
        })
        .collect::<Result<Vec<String>>>()?;

    let refs: Vec<&str> = docs.iter().map(String::as_str).collect();
    load_layered_yaml_from_strings(&refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = Value::Object(Map::new());

    for (layer, raw) in yaml_docs.iter().enumerate() {
        let parsed: serde_yaml::Value =
            serde_yaml::from_str(raw).with_context(|| format!("invalid yaml in layer {layer}"))?;
        if parsed.is_null() {
            // blank file
            continue;
        }
        let as_json =
            serde_json::to_value(parsed).with_context(|| format!("layer {layer}: yaml->json failed"))?;
        overlay(&mut merged, as_json);
    }

    let canonical_json = serde_json::to_string(&with_sorted_keys(&merged))
        .context("canonical json serialize failed")?;
    let config_hash = hex::encode(Sha256::digest(canonical_json.as_bytes()));

    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

/// Objects merge key by key; anything else in `layer` replaces `base`.
fn overlay(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base_map), Value::Object(layer_map)) => {
            for (key, value) in layer_map {
                match base_map.get_mut(&key) {
                    Some(existing) => overlay(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, replacement) => *slot = replacement,
    }
}

fn with_sorted_keys(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), with_sorted_keys(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(with_sorted_keys).collect()),
        scalar => scalar.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn overlay_merges_objects_and_replaces_scalars_and_arrays() {
        let mut base = json!({"a": {"x": 1, "y": [1, 2]}, "b": 1});
        overlay(&mut base, json!({"a": {"y": [3]}, "c": true}));
        assert_eq!(base, json!({"a": {"x": 1, "y": [3]}, "b": 1, "c": true}));
    }

    #[test]
    fn blank_layer_is_skipped() {
        let loaded = load_layered_yaml_from_strings(&["", "backtest:\n  windows: [2]\n"]).unwrap();
        assert_eq!(loaded.config_json["backtest"]["windows"][0], 2);
    }

    #[test]
    fn canonical_text_sorts_nested_keys() {
        let loaded = load_layered_yaml_from_strings(&["z: 1\na:\n  d: 1\n  c: 2\n"]).unwrap();
        assert_eq!(loaded.canonical_json, r#"{"a":{"c":2,"d":1},"z":1}"#);
    }
}
