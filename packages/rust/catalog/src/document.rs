//! Recipe document reading.
//!
//! A recipe document is any text file that carries a JSON payload: either a
//! bare array of records, an object with a `recipes` array, or prose with an
//! array embedded somewhere in it. Only the payload is decoded here; record
//! validation belongs to [`RecipeCatalog`].

use std::path::Path;

use serde_json::Value;
use tracing::{debug, info, instrument};

use larder_shared::{LarderError, Result};

use crate::RecipeCatalog;

/// Read a recipe document from disk and build a validated catalog from it.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_catalog(path: &Path) -> Result<RecipeCatalog> {
    let text = std::fs::read_to_string(path).map_err(|e| LarderError::io(path, e))?;
    let values = decode_records(&text)?;
    info!(records = values.len(), "recipe document decoded");
    Ok(RecipeCatalog::from_values(values)?)
}

/// Locate and decode the JSON record list inside a document's text.
pub fn decode_records(text: &str) -> Result<Vec<Value>> {
    let trimmed = text.trim_start_matches('\u{feff}').trim();
    if trimmed.is_empty() {
        return Err(LarderError::document("document is empty"));
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => records_from_value(value),
        Err(whole_err) => {
            debug!(error = %whole_err, "document is not pure JSON, searching for embedded array");
            let payload = embedded_array(trimmed).ok_or_else(|| {
                LarderError::document(format!("no JSON recipe list found: {whole_err}"))
            })?;
            let value: Value = serde_json::from_str(payload).map_err(|e| {
                LarderError::document(format!("embedded recipe list is not valid JSON: {e}"))
            })?;
            records_from_value(value)
        }
    }
}

fn records_from_value(value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("recipes") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(LarderError::document(
                "JSON object has no `recipes` array",
            )),
        },
        _ => Err(LarderError::document(
            "expected a JSON array of recipes",
        )),
    }
}

/// Slice from the first `[` to the last `]`.
fn embedded_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}
