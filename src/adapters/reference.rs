//! Reference data loaders
//!
//! Reads the code set mapping and the indicator catalog from JSON files.
//! A missing file is `NotFound`; unparseable JSON is `InvalidFormat`.

use crate::domain::errors::ReferenceDataError;
use crate::domain::Result;
use crate::reference::{CodeSetRegistry, IndicatorCatalog};
use std::fs;
use std::path::Path;

/// Load the code set registry from a JSON object of name to code list
///
/// # Errors
///
/// Returns a reference data error if the file is missing, is not JSON, or
/// does not have the expected shape.
pub fn load_code_sets(path: impl AsRef<Path>) -> Result<CodeSetRegistry> {
    let path = path.as_ref();
    let value = read_json(path)?;
    let registry = CodeSetRegistry::from_json_value(&value)?;

    let empty = registry.empty_sets();
    if !empty.is_empty() {
        tracing::warn!(
            path = %path.display(),
            empty_sets = ?empty,
            "Code sets loaded with empty entries"
        );
    }
    tracing::info!(path = %path.display(), code_sets = registry.len(), "Code sets loaded");

    Ok(registry)
}

/// Load the indicator catalog
///
/// With no path, the standard catalog embedded in the binary is used.
pub fn load_catalog(path: Option<&Path>) -> Result<IndicatorCatalog> {
    let catalog = match path {
        Some(path) => {
            let value = read_json(path)?;
            let catalog = IndicatorCatalog::from_json_value(value)?;
            tracing::info!(path = %path.display(), indicators = catalog.len(), "Indicator catalog loaded");
            catalog
        }
        None => {
            let catalog = IndicatorCatalog::standard()?;
            tracing::info!(indicators = catalog.len(), "Using embedded indicator catalog");
            catalog
        }
    };
    Ok(catalog)
}

fn read_json(path: &Path) -> std::result::Result<serde_json::Value, ReferenceDataError> {
    if !path.exists() {
        return Err(ReferenceDataError::NotFound(path.display().to_string()));
    }
    let content = fs::read_to_string(path)
        .map_err(|e| ReferenceDataError::InvalidFormat(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&content)
        .map_err(|e| ReferenceDataError::InvalidFormat(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PsiError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn json_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_code_sets() {
        let file = json_file(r#"{"LOWMODR": ["775", "776"], "EMPTY": []}"#);
        let registry = load_code_sets(file.path()).unwrap();

        assert!(registry.contains("LOWMODR", "776"));
        assert!(registry.has_set("EMPTY"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_missing_code_set_file() {
        let err = load_code_sets("/nonexistent/code_sets.json").unwrap_err();
        assert!(matches!(err, PsiError::ReferenceData(ReferenceDataError::NotFound(_))));
    }

    #[test]
    fn test_invalid_json() {
        let file = json_file("{not json");
        let err = load_code_sets(file.path()).unwrap_err();
        assert!(matches!(err, PsiError::ReferenceData(ReferenceDataError::InvalidFormat(_))));
    }

    #[test]
    fn test_embedded_catalog_when_no_path() {
        let catalog = load_catalog(None).unwrap();
        assert_eq!(catalog.len(), 18);
    }
}
