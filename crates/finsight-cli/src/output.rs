//! Saving reports to disk

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use finsight_runtime::AnalysisKind;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::info;

/// Directory for auto-named and interactive reports
pub const ANALYSIS_DIR: &str = "analysis";

/// Where a report ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedReport {
    pub path: PathBuf,
    pub bytes: usize,
}

/// Write a report as UTF-8, creating parent directories as needed
pub fn save_report(text: &str, path: &Path) -> Result<SavedReport> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        info!(dir = %parent.display(), "Created directory");
    }

    fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;

    let path = std::path::absolute(path)
        .with_context(|| format!("Failed to resolve {}", path.display()))?;
    info!(path = %path.display(), bytes = text.len(), "Report saved");

    Ok(SavedReport {
        path,
        bytes: text.len(),
    })
}

/// `analysis/{kind}_analysis_{YYYYmmdd_HHMMSS}.txt`
pub fn default_report_path(kind: AnalysisKind, now: DateTime<Local>) -> PathBuf {
    Path::new(ANALYSIS_DIR).join(format!(
        "{}_analysis_{}.txt",
        kind.as_str(),
        now.format("%Y%m%d_%H%M%S")
    ))
}

/// Place a bare relative filename under `analysis/`
///
/// Absolute paths and paths that start with `.` (such as `./report.txt` or
/// `../out/report.txt`) are used as given.
pub fn resolve_interactive_path(input: &str) -> PathBuf {
    let path = Path::new(input.trim());
    let explicit = path.is_absolute()
        || matches!(
            path.components().next(),
            Some(Component::CurDir | Component::ParentDir)
        )
        || input.trim().starts_with('.');

    if explicit {
        path.to_path_buf()
    } else {
        Path::new(ANALYSIS_DIR).join(path)
    }
}
