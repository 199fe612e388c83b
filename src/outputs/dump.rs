//! Failure dumps.
//!
//! When a walk fails, the page it failed on is the only evidence of what the
//! site served. It is written next to a short text file naming the error.

use crate::error::WalkFailure;
use crate::utils::ensure_writable_dir;
use chrono::{DateTime, Utc};
use std::error::Error;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Write the failure's raw page and description into `dump_dir`.
///
/// Files are named `failure_<UTC stamp>.html` and `failure_<UTC stamp>.txt`.
/// The HTML file is skipped when no page was loaded (e.g. the fetch itself
/// failed).
///
/// # Returns
///
/// The paths that were written.
#[instrument(level = "info", skip_all, fields(dump_dir = %dump_dir.display()))]
pub async fn write_failure_dump(
    failure: &WalkFailure,
    dump_dir: &Path,
    at: DateTime<Utc>,
) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    ensure_writable_dir(dump_dir).await?;

    let stem = format!("failure_{}", at.format("%Y%m%dT%H%M%SZ"));
    let mut written = Vec::new();

    let mut report = String::new();
    writeln!(report, "error: {}", failure.error)?;
    writeln!(report, "page: {}", failure.page_number)?;
    writeln!(report, "request: {}", failure.request)?;
    writeln!(report, "detected_at: {}", at.to_rfc3339())?;

    let txt_path = dump_dir.join(format!("{stem}.txt"));
    fs::write(&txt_path, report).await?;
    written.push(txt_path);

    if let Some(raw) = &failure.raw_page {
        let html_path = dump_dir.join(format!("{stem}.html"));
        fs::write(&html_path, raw).await?;
        written.push(html_path);
    }

    info!(files = written.len(), "Wrote failure dump");
    Ok(written)
}
