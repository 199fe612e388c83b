//! Utility functions for timestamp parsing, log shaping and file system checks.
//!
//! - Parsing the listing's age attribute into an absolute instant
//! - Truncating page bodies before they reach the log
//! - Validating output directories before a run starts

use chrono::{DateTime, NaiveDateTime, Utc};
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

const AGE_ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parse an age marker's `title` attribute.
///
/// The attribute reads `"2025-05-06T10:00:00 1746525600"`: a naive ISO-8601
/// UTC time followed by the same instant in unix seconds. Older markup only
/// carries the ISO part. The unix part wins when both are present.
///
/// # Returns
///
/// `None` if neither part can be read.
///
/// # Examples
///
/// ```ignore
/// let t = parse_age_attr("2025-05-06T10:00:00").unwrap();
/// assert_eq!(t.to_rfc3339(), "2025-05-06T10:00:00+00:00");
/// ```
pub fn parse_age_attr(value: &str) -> Option<DateTime<Utc>> {
    let mut parts = value.split_whitespace();
    let iso = parts.next()?;

    if let Some(secs) = parts.next().and_then(|s| s.parse::<i64>().ok()) {
        return DateTime::from_timestamp(secs, 0);
    }

    NaiveDateTime::parse_from_str(iso, AGE_ISO_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at the last char boundary at or below `max` bytes and
/// get `"…(+N bytes)"` appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or written to.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;

    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}
