//! The tracked-deps document: dependency names per package file per manager.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde_json::Value;

/// Document shape: file path -> manager -> sorted unique dependency names.
///
/// `BTreeMap` keys make the file and manager orderings structural; the name
/// vectors are built sorted and deduplicated by [`crate::core::extract`].
pub type TrackedDeps = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Render a JSON document in canonical form: sorted keys, 2-space indent,
/// trailing newline.
///
/// `serde_json::Value` objects are `BTreeMap`-backed, so key order is already
/// sorted; pretty-printing fixes the indent.
pub fn canonical_json(value: &Value) -> Result<String> {
    let mut rendered = serde_json::to_string_pretty(value).context("render document")?;
    rendered.push('\n');
    Ok(rendered)
}
