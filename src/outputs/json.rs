//! JSON run summary.
//!
//! The summary is written once per run, pass or fail, so a wrapper script can
//! read the outcome without scraping log lines.

use crate::models::RunSummary;
use crate::utils::ensure_writable_dir;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Write a [`RunSummary`] as pretty-printed JSON to `path`.
///
/// The parent directory is created if it does not exist.
///
/// # Errors
///
/// Returns an error if the directory is not writable, serialization fails, or
/// the file cannot be written.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_run_summary(summary: &RunSummary, path: &Path) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_writable_dir(parent).await?;
    }

    let json = serde_json::to_string_pretty(summary)?;
    fs::write(path, json).await?;
    info!(passed = summary.passed, "Wrote run summary");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_write_run_summary_creates_parent_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("runs/latest.json");
        let summary = RunSummary {
            passed: false,
            target: 100,
            verified: 42,
            pages_fetched: 2,
            duplicates_skipped: 1,
            newest: Some(Utc.with_ymd_and_hms(2025, 5, 6, 10, 0, 0).unwrap()),
            oldest: Some(Utc.with_ymd_and_hms(2025, 5, 6, 9, 0, 0).unwrap()),
            started_at: Utc.with_ymd_and_hms(2025, 5, 6, 10, 0, 5).unwrap(),
            elapsed_ms: 1500,
            failure: Some("page 2 (follow newest?next=1&n=31): order violation".to_string()),
        };

        write_run_summary(&summary, &path).await.unwrap();

        let written: RunSummary =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(!written.passed);
        assert_eq!(written.verified, 42);
        assert_eq!(written.failure.as_deref(), summary.failure.as_deref());
    }
}
