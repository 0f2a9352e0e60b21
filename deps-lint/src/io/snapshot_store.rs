//! Committed snapshot storage: load with schema validation, atomic writes.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use jsonschema::Draft;
use serde_json::Value;

use crate::core::snapshot::{TrackedDeps, canonical_json};

const SNAPSHOT_SCHEMA: &str = include_str!("../../schemas/tracked_deps/v1.schema.json");

/// Load the committed snapshot and validate it against the v1 schema.
pub fn load_snapshot(path: &Path) -> Result<Value> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let value: Value =
        serde_json::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    validate_schema(&value).with_context(|| format!("validate {}", path.display()))?;
    Ok(value)
}

/// Write the generated document in canonical form (temp file + rename).
pub fn write_snapshot(path: &Path, doc: &TrackedDeps) -> Result<()> {
    let value = serde_json::to_value(doc).context("serialize tracked deps")?;
    let rendered = canonical_json(&value)?;
    let parent = path
        .parent()
        .with_context(|| format!("snapshot path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, &rendered)
        .with_context(|| format!("write temp snapshot {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace snapshot {}", path.display()))?;
    Ok(())
}

/// Validate a snapshot document against the committed schema (Draft 2020-12).
fn validate_schema(instance: &Value) -> Result<()> {
    let schema: Value = serde_json::from_str(SNAPSHOT_SCHEMA).context("parse snapshot schema")?;
    let compiled = jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(&schema)
        .context("compile snapshot schema")?;
    let messages: Vec<String> = compiled
        .iter_errors(instance)
        .map(|err| err.to_string())
        .collect();
    if !messages.is_empty() {
        bail!("schema validation failed:\n- {}", messages.join("\n- "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sample_doc() -> TrackedDeps {
        let mut doc = TrackedDeps::new();
        let mut managers = BTreeMap::new();
        managers.insert(
            "npm".to_string(),
            vec!["left".to_string(), "right".to_string()],
        );
        doc.insert("package.json".to_string(), managers);
        doc
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(".github/renovate-tracked-deps.json");

        write_snapshot(&path, &sample_doc()).expect("write");
        let loaded = load_snapshot(&path).expect("load");
        assert_eq!(loaded, serde_json::to_value(sample_doc()).expect("value"));
    }

    #[test]
    fn written_snapshot_is_canonical_with_trailing_newline() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("deps.json");

        write_snapshot(&path, &sample_doc()).expect("write");
        let contents = fs::read_to_string(&path).expect("read");
        assert!(contents.ends_with("}\n"));
        assert!(contents.contains("  \"package.json\""));
    }

    #[test]
    fn load_rejects_unparseable_json() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("deps.json");
        fs::write(&path, "{not json").expect("write");

        let err = load_snapshot(&path).unwrap_err();
        assert!(format!("{err:#}").contains("parse"));
    }

    #[test]
    fn load_rejects_documents_off_schema() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("deps.json");
        fs::write(&path, r#"{"pkg.json": {"npm": [1, 2]}}"#).expect("write");

        let err = load_snapshot(&path).unwrap_err();
        assert!(format!("{err:#}").contains("schema validation failed"));
    }

    #[test]
    fn write_replaces_existing_file_atomically() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("deps.json");
        fs::write(&path, "old").expect("seed");

        write_snapshot(&path, &sample_doc()).expect("write");
        let contents = fs::read_to_string(&path).expect("read");
        assert!(contents.contains("package.json"));
        assert!(!path.with_extension("json.tmp").exists());
    }
}
