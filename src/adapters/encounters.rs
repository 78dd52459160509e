//! Encounter input reader

use crate::domain::encounter::EncounterRecord;
use crate::domain::{PsiError, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Read encounters from a JSON array of flat objects
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read, a serialization error if
/// it is not JSON, and a validation error if it is not an array of objects.
pub fn read_encounters(path: impl AsRef<Path>) -> Result<Vec<EncounterRecord>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .map_err(|e| PsiError::Io(format!("Failed to read encounters from {}: {e}", path.display())))?;
    let records = parse_encounters(&content)?;

    tracing::info!(path = %path.display(), encounters = records.len(), "Encounters loaded");
    Ok(records)
}

/// Parse encounters from JSON text
pub fn parse_encounters(content: &str) -> Result<Vec<EncounterRecord>> {
    let value: Value = serde_json::from_str(content)?;
    let Value::Array(items) = value else {
        return Err(PsiError::Validation(
            "Encounter input must be a JSON array of objects".to_string(),
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(position, item)| match item {
            Value::Object(fields) => Ok(EncounterRecord::from(
                fields.into_iter().collect::<std::collections::BTreeMap<_, _>>(),
            )),
            _ => Err(PsiError::Validation(format!(
                "Encounter at position {} is not a JSON object",
                position + 1
            ))),
        })
        .collect()
}
