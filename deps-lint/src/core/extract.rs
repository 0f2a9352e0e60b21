//! Extraction of the dependency inventory from a Renovate debug log.
//!
//! The scanner logs one JSON record per line. The record whose `msg` field is
//! `"packageFiles with updates"` carries the fully resolved package-file
//! config; the last such record wins. Lines that are not JSON are log noise
//! and are skipped.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::core::snapshot::TrackedDeps;

/// Marker message on the log line carrying the resolved config.
pub const MARKER_MSG: &str = "packageFiles with updates";

/// Skip reasons meaning the entry is not a concrete pinned dependency.
const EXCLUDED_SKIP_REASONS: [&str; 3] = ["contains-variable", "invalid-value", "invalid-version"];

/// One package file reported by the scanner, with its dependency records.
#[derive(Debug, Deserialize)]
struct PackageFile {
    #[serde(rename = "packageFile", default)]
    package_file: String,
    #[serde(default)]
    deps: Vec<Dep>,
}

#[derive(Debug, Deserialize)]
struct Dep {
    #[serde(rename = "depName")]
    dep_name: Option<String>,
    #[serde(rename = "skipReason")]
    skip_reason: Option<String>,
}

/// Extract the tracked-deps document from the raw log text.
///
/// Fails when no marker line exists in the log (unexpected scanner output) or
/// when the winning config payload does not have the expected shape.
pub fn extract_deps(log_text: &str, excluded_managers: &BTreeSet<String>) -> Result<TrackedDeps> {
    let config = find_marker_config(log_text)
        .ok_or_else(|| anyhow!("'{MARKER_MSG}' message not found in scanner log"))?;
    let managers: BTreeMap<String, Vec<PackageFile>> =
        serde_json::from_value(config).context("parse config payload of the marker line")?;
    debug!(managers = managers.len(), "parsed marker config");
    Ok(collect_deps(managers, excluded_managers))
}

/// Scan every line, returning the `config` payload of the last marker line.
///
/// Last-write-wins: the scanner may log the marker more than once and the
/// final record reflects the resolved config.
fn find_marker_config(log_text: &str) -> Option<Value> {
    let mut config = None;
    for line in log_text.lines() {
        let Ok(entry) = serde_json::from_str::<Value>(line) else {
            continue;
        };
        if entry.get("msg").and_then(Value::as_str) == Some(MARKER_MSG) {
            config = Some(
                entry
                    .get("config")
                    .cloned()
                    .unwrap_or_else(|| Value::Object(serde_json::Map::new())),
            );
        }
    }
    config
}

fn collect_deps(
    managers: BTreeMap<String, Vec<PackageFile>>,
    excluded_managers: &BTreeSet<String>,
) -> TrackedDeps {
    let mut by_file: BTreeMap<String, BTreeMap<String, BTreeSet<String>>> = BTreeMap::new();
    for (manager, package_files) in managers {
        if excluded_managers.contains(&manager) {
            continue;
        }
        for package_file in package_files {
            for dep in package_file.deps {
                if dep.skip_reason.as_deref().is_some_and(is_excluded_skip_reason) {
                    continue;
                }
                let Some(name) = dep.dep_name else {
                    continue;
                };
                if name.is_empty() {
                    continue;
                }
                by_file
                    .entry(package_file.package_file.clone())
                    .or_default()
                    .entry(manager.clone())
                    .or_default()
                    .insert(name);
            }
        }
    }

    // Entries only materialize when a dependency survives filtering, so the
    // document never contains empty file or manager objects.
    by_file
        .into_iter()
        .map(|(file, by_manager)| {
            let by_manager = by_manager
                .into_iter()
                .map(|(manager, names)| (manager, names.into_iter().collect()))
                .collect();
            (file, by_manager)
        })
        .collect()
}

fn is_excluded_skip_reason(reason: &str) -> bool {
    EXCLUDED_SKIP_REASONS.contains(&reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Single log line carrying the marker message and a config payload.
    fn marker_line(config: Value) -> String {
        json!({"msg": MARKER_MSG, "config": config}).to_string()
    }

    fn package_file(path: &str, deps: Value) -> Value {
        json!({"packageFile": path, "deps": deps})
    }

    fn extract(log: &str) -> TrackedDeps {
        extract_deps(log, &BTreeSet::new()).expect("extract")
    }

    #[test]
    fn dep_names_are_sorted_and_deduplicated() {
        let log = marker_line(json!({
            "npm": [package_file(
                "package.json",
                json!([{"depName": "b"}, {"depName": "a"}, {"depName": "a"}]),
            )]
        }));
        let doc = extract(&log);
        assert_eq!(doc["package.json"]["npm"], vec!["a", "b"]);
    }

    #[test]
    fn non_json_lines_are_skipped() {
        let marker = marker_line(json!({
            "npm": [package_file("p.json", json!([{"depName": "x"}]))]
        }));
        let log = format!("renovate starting\nnot json {{\n{marker}\n(done)\n");
        let doc = extract(&log);
        assert_eq!(doc["p.json"]["npm"], vec!["x"]);
    }

    #[test]
    fn last_marker_line_wins() {
        let first = marker_line(json!({
            "npm": [package_file("p.json", json!([{"depName": "old"}]))]
        }));
        let second = marker_line(json!({
            "npm": [package_file("p.json", json!([{"depName": "new"}]))]
        }));
        let doc = extract(&format!("{first}\n{second}\n"));
        assert_eq!(doc["p.json"]["npm"], vec!["new"]);
    }

    #[test]
    fn missing_marker_is_an_error() {
        let err = extract_deps(r#"{"msg":"something else"}"#, &BTreeSet::new()).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn marker_without_config_yields_empty_document() {
        let doc = extract(r#"{"msg":"packageFiles with updates"}"#);
        assert!(doc.is_empty());
    }

    #[test]
    fn excluded_managers_are_dropped_wholesale() {
        let log = marker_line(json!({
            "npm": [package_file("p.json", json!([{"depName": "x"}]))],
            "gomod": [package_file("go.mod", json!([{"depName": "y"}]))],
        }));
        let excluded: BTreeSet<String> = ["gomod".to_string()].into();
        let doc = extract_deps(&log, &excluded).expect("extract");
        assert!(doc.contains_key("p.json"));
        assert!(!doc.contains_key("go.mod"));
    }

    #[test]
    fn skip_reasons_and_nameless_deps_are_filtered() {
        let log = marker_line(json!({
            "npm": [package_file(
                "p.json",
                json!([
                    {"depName": "kept"},
                    {"depName": "var", "skipReason": "contains-variable"},
                    {"depName": "bad", "skipReason": "invalid-value"},
                    {"depName": "worse", "skipReason": "invalid-version"},
                    {"depName": "unrelated", "skipReason": "internal-package"},
                    {"skipReason": "invalid-version"},
                    {"depName": ""},
                    {},
                ]),
            )]
        }));
        let doc = extract(&log);
        assert_eq!(doc["p.json"]["npm"], vec!["kept", "unrelated"]);
    }

    #[test]
    fn extraction_is_independent_of_noise_line_order() {
        let marker = marker_line(json!({
            "npm": [package_file("p.json", json!([{"depName": "x"}]))]
        }));
        let a = format!("{{\"msg\":\"noise-1\"}}\n{{\"msg\":\"noise-2\"}}\n{marker}\n");
        let b = format!("{{\"msg\":\"noise-2\"}}\n{marker}\n{{\"msg\":\"noise-1\"}}\n");
        assert_eq!(extract(&a), extract(&b));
    }

    #[test]
    fn files_with_no_surviving_deps_are_omitted() {
        let log = marker_line(json!({
            "npm": [
                package_file("kept.json", json!([{"depName": "x"}])),
                package_file("empty.json", json!([{"depName": "v", "skipReason": "invalid-version"}])),
            ]
        }));
        let doc = extract(&log);
        assert!(doc.contains_key("kept.json"));
        assert!(!doc.contains_key("empty.json"));
    }

    #[test]
    fn missing_package_file_field_groups_under_empty_path() {
        let log = marker_line(json!({"npm": [{"deps": [{"depName": "x"}]}]}));
        let doc = extract(&log);
        assert_eq!(doc[""]["npm"], vec!["x"]);
    }
}
