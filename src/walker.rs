//! The page walker: load a page, verify it, follow "More", repeat.
//!
//! # Flow
//!
//! 1. Open the listing at the starting offset
//! 2. Pair the page's timestamp, id and title columns (count mismatch is fatal)
//! 3. Drop entries already verified on an earlier page (see [`OverlapPolicy`])
//! 4. Check each remaining entry against the cursor's bound, up to the target
//! 5. Follow the page's single pagination control, pausing a random interval first
//!
//! The walk stops at the first failure. [`run`] wraps [`walk`] so the listing
//! session is released on every exit path.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use rand::{Rng, rng};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use crate::error::{VerifyError, WalkFailure};
use crate::models::{Cursor, Entry, WalkReport};
use crate::scrapers::{ListingSource, PageRequest};

/// What to do with an entry whose id was already verified earlier in the run.
///
/// Offset-based pagination shifts when new submissions arrive between page
/// loads, which repeats the tail of one page at the head of the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OverlapPolicy {
    /// Skip repeats before comparison; they are not counted toward the target.
    #[default]
    Tolerate,
    /// Treat any repeat as fatal.
    Fail,
}

/// Randomized delay between page transitions.
///
/// Only there to stay under upstream rate limits. It never affects what is
/// verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    min_ms: u64,
    max_ms: u64,
}

impl Pacing {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms,
        }
    }

    pub fn none() -> Self {
        Self::new(0, 0)
    }

    pub fn next_delay(&self) -> Duration {
        if self.min_ms == self.max_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rng().random_range(self.min_ms..=self.max_ms))
    }

    pub async fn pause(&self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            debug!(?delay, "Pacing before next page");
            sleep(delay).await;
        }
    }
}

/// Parameters of one walk.
#[derive(Debug, Clone)]
pub struct WalkConfig {
    /// Number of entries to verify.
    pub target: usize,
    /// Offset the first page is opened at.
    pub start_offset: usize,
    /// Upper bound for the first entry; nothing listed can be newer.
    pub initial_bound: DateTime<Utc>,
    pub pacing: Pacing,
    pub overlap: OverlapPolicy,
}

/// Verify entries against the cursor and return the advanced cursor.
///
/// Only the first `min(entries.len(), target - cursor.verified)` entries are
/// evaluated. An entry equal to the bound is accepted.
///
/// # Errors
///
/// [`VerifyError::OrderViolation`] at the first entry strictly newer than the
/// bound.
pub fn verify_entries(
    mut cursor: Cursor,
    entries: &[Entry],
    target: usize,
) -> Result<Cursor, VerifyError> {
    for entry in entries.iter().take(cursor.remaining(target)) {
        if entry.timestamp > cursor.bound {
            return Err(VerifyError::OrderViolation {
                position: cursor.verified + 1,
                id: entry.id.clone(),
                title: entry.title.clone(),
                timestamp: entry.timestamp,
                bound: cursor.bound,
            });
        }
        debug!(
            position = cursor.verified + 1,
            id = %entry.id,
            timestamp = %entry.timestamp,
            title = %entry.title,
            "Entry in order"
        );
        cursor.bound = entry.timestamp;
        cursor.verified += 1;
    }
    Ok(cursor)
}

/// Walk the listing until `config.target` entries are verified.
///
/// # Errors
///
/// A [`WalkFailure`] carrying the first problem found and the page it was
/// found on.
#[instrument(level = "info", skip_all, fields(target = config.target, start_offset = config.start_offset))]
pub async fn walk<S: ListingSource>(
    source: &mut S,
    config: &WalkConfig,
) -> Result<WalkReport, WalkFailure> {
    let mut report = WalkReport::default();
    match walk_pages(source, config, &mut report).await {
        Ok(()) => Ok(report),
        Err(mut failure) => {
            failure.progress = report;
            Err(failure)
        }
    }
}

async fn walk_pages<S: ListingSource>(
    source: &mut S,
    config: &WalkConfig,
    report: &mut WalkReport,
) -> Result<(), WalkFailure> {
    let mut cursor = Cursor::start(config.initial_bound);
    let mut seen: HashSet<String> = HashSet::new();
    let mut request = PageRequest::Offset(config.start_offset);

    while cursor.verified < config.target {
        if report.pages_fetched > 0 {
            config.pacing.pause().await;
        }

        let page_number = report.pages_fetched + 1;
        let mut listing = source
            .fetch(&request)
            .await
            .map_err(|e| WalkFailure::new(page_number, request.clone(), e))?;
        report.pages_fetched += 1;

        let raw = std::mem::take(&mut listing.raw);
        let more_links = std::mem::take(&mut listing.more_links);
        let fail = |error| WalkFailure::new(page_number, request.clone(), error).with_page(&raw);

        let remaining = cursor.remaining(config.target);
        let entries = listing.into_entries().map_err(&fail)?;
        let on_page = entries.len();
        if entries.is_empty() {
            return Err(fail(VerifyError::EmptyPage { remaining }));
        }

        let mut fresh = Vec::with_capacity(remaining.min(entries.len()));
        let mut skipped = 0;
        for entry in entries {
            if fresh.len() == remaining {
                break;
            }
            if !seen.insert(entry.id.clone()) {
                match config.overlap {
                    OverlapPolicy::Fail => {
                        return Err(fail(VerifyError::DuplicateEntry { id: entry.id }));
                    }
                    OverlapPolicy::Tolerate => {
                        warn!(id = %entry.id, page = page_number, "Skipping entry already verified");
                        skipped += 1;
                        continue;
                    }
                }
            }
            fresh.push(entry);
        }

        let before = cursor.verified;
        let checked = verify_entries(cursor, &fresh, config.target);
        // entries accepted ahead of a violation still count as progress
        let evaluated = match &checked {
            Ok(advanced) => advanced.verified - before,
            Err(VerifyError::OrderViolation { position, .. }) => position - 1 - before,
            Err(_) => 0,
        };
        if evaluated > 0 {
            if report.newest.is_none() {
                report.newest = Some(fresh[0].timestamp);
            }
            report.oldest = Some(fresh[evaluated - 1].timestamp);
            report.verified = before + evaluated;
        }
        report.duplicates_skipped += skipped;
        cursor = checked.map_err(&fail)?;

        info!(
            page = page_number,
            %request,
            on_page,
            evaluated,
            skipped,
            verified = cursor.verified,
            target = config.target,
            page_newest = ?fresh.first().map(|e| e.timestamp),
            page_oldest = ?fresh.last().map(|e| e.timestamp),
            "Verified page"
        );

        if cursor.verified >= config.target {
            break;
        }

        match more_links.as_slice() {
            [href] => request = PageRequest::Follow(href.clone()),
            links => {
                return Err(fail(VerifyError::NavigationFailure { found: links.len() }));
            }
        }
    }

    Ok(())
}

/// Walk the listing, then release the session whatever the outcome.
pub async fn run<S: ListingSource>(
    source: &mut S,
    config: &WalkConfig,
) -> Result<WalkReport, WalkFailure> {
    let outcome = walk(source, config).await;
    source.close().await;
    outcome
}
