//! Result writer

use crate::domain::context::ResultExt;
use crate::domain::evaluation::EvaluationResult;
use crate::domain::{PsiError, Result};
use std::fs;
use std::path::Path;

/// Render results as a JSON array
pub fn render_results(results: &[EvaluationResult], pretty: bool) -> Result<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(results)?
    } else {
        serde_json::to_string(results)?
    };
    Ok(rendered)
}

/// Write results to a JSON file, creating parent directories as needed
pub fn write_results(path: impl AsRef<Path>, results: &[EvaluationResult], pretty: bool) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
    }

    let rendered = render_results(results, pretty)?;
    fs::write(path, rendered)
        .map_err(|e| PsiError::Io(format!("Failed to write results to {}: {e}", path.display())))?;

    tracing::info!(path = %path.display(), rows = results.len(), "Results written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::evaluation::{EvaluationStatus, Outcome};
    use crate::domain::ids::{EncounterId, IndicatorId};
    use tempfile::TempDir;

    fn rows() -> Vec<EvaluationResult> {
        vec![EvaluationResult::from_outcome(
            EncounterId::new("E1").unwrap(),
            IndicatorId::from_number(4),
            Outcome::inclusion("Inclusion: Death among surgical inpatients with SHOCK")
                .with_detail("stratum", "SHOCK"),
        )]
    }

    #[test]
    fn test_write_results_creates_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/results.json");

        write_results(&path, &rows(), true).unwrap();

        let written: Vec<EvaluationResult> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].status, EvaluationStatus::Inclusion);
        assert_eq!(written[0].details.get("stratum").map(String::as_str), Some("SHOCK"));
    }

    #[test]
    fn test_compact_rendering_is_single_line() {
        let rendered = render_results(&rows(), false).unwrap();
        assert!(!rendered.contains('\n'));
        assert!(rendered.contains("\"PSI\":\"PSI_04\""));
    }
}
