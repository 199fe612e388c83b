//! Data models for listing entries and the state of a verification run.
//!
//! - [`Entry`]: one listed submission, built per page load and dropped after comparison
//! - [`RawListing`]: the extracted columns of a single page, before pairing
//! - [`Cursor`]: the running (verified count, newest bound) carried between pages
//! - [`WalkReport`]: how far a walk got
//! - [`RunSummary`]: the serializable outcome of a whole run

use std::time::Duration;

use chrono::{DateTime, Utc};
use itertools::izip;
use serde::{Deserialize, Serialize};

use crate::error::{VerifyError, WalkFailure};

/// A single submission as listed on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: String,
    pub title: String,
    pub timestamp: DateTime<Utc>,
}

impl Entry {
    pub fn new(id: impl Into<String>, title: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            timestamp,
        }
    }
}

/// Everything extracted from one page load.
///
/// The three entry columns are kept apart until [`RawListing::into_entries`]
/// so a partially rendered page shows up as a count mismatch instead of
/// silently mispairing titles with timestamps.
#[derive(Debug, Clone, Default)]
pub struct RawListing {
    pub timestamps: Vec<DateTime<Utc>>,
    pub ids: Vec<String>,
    pub titles: Vec<String>,
    /// Href of every pagination control found on the page.
    pub more_links: Vec<String>,
    /// The page body, kept for failure dumps.
    pub raw: String,
}

impl RawListing {
    /// Pair the columns into entries.
    ///
    /// # Errors
    ///
    /// [`VerifyError::StructuralMismatch`] when the columns differ in length.
    pub fn into_entries(self) -> Result<Vec<Entry>, VerifyError> {
        let (timestamps, ids, titles) = (self.timestamps.len(), self.ids.len(), self.titles.len());
        if timestamps != ids || ids != titles {
            return Err(VerifyError::StructuralMismatch {
                timestamps,
                ids,
                titles,
            });
        }

        Ok(izip!(self.ids, self.titles, self.timestamps)
            .map(|(id, title, timestamp)| Entry::new(id, title, timestamp))
            .collect())
    }
}

/// Running state of a walk.
///
/// `verified` only grows and `bound` only moves back in time (or stays put).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub verified: usize,
    /// Timestamp of the most recently verified entry; the next one must not exceed it.
    pub bound: DateTime<Utc>,
}

impl Cursor {
    pub fn start(bound: DateTime<Utc>) -> Self {
        Self { verified: 0, bound }
    }

    pub fn remaining(&self, target: usize) -> usize {
        target.saturating_sub(self.verified)
    }
}

/// Progress of a walk; the final value when it reaches its target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkReport {
    pub verified: usize,
    pub pages_fetched: usize,
    pub duplicates_skipped: usize,
    /// Timestamp of the first verified entry.
    pub newest: Option<DateTime<Utc>>,
    /// Timestamp of the last verified entry.
    pub oldest: Option<DateTime<Utc>>,
}

/// Serializable outcome of a run, written by `--summary-json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub passed: bool,
    pub target: usize,
    pub verified: usize,
    pub pages_fetched: usize,
    pub duplicates_skipped: usize,
    pub newest: Option<DateTime<Utc>>,
    pub oldest: Option<DateTime<Utc>>,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub failure: Option<String>,
}

impl RunSummary {
    /// Summarize a finished walk.
    pub fn new(
        outcome: &Result<WalkReport, WalkFailure>,
        target: usize,
        started_at: DateTime<Utc>,
        elapsed: Duration,
    ) -> Self {
        let (report, failure) = match outcome {
            Ok(report) => (report, None),
            Err(failure) => (&failure.progress, Some(failure.to_string())),
        };
        Self {
            passed: failure.is_none(),
            target,
            verified: report.verified,
            pages_fetched: report.pages_fetched,
            duplicates_skipped: report.duplicates_skipped,
            newest: report.newest,
            oldest: report.oldest,
            started_at,
            elapsed_ms: elapsed.as_millis() as u64,
            failure,
        }
    }
}
