//! In-memory listing source for exercising the walker without a network.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, TimeZone, Utc};

use super::{ListingSource, PageRequest};
use crate::error::VerifyError;
use crate::models::RawListing;

/// Serves canned pages (or fetch errors) in order and records what was asked of it.
#[derive(Debug, Default)]
pub struct FixtureSource {
    responses: VecDeque<Result<RawListing, VerifyError>>,
    pub requests: Vec<PageRequest>,
    pub closed: bool,
}

impl FixtureSource {
    pub fn new(pages: Vec<RawListing>) -> Self {
        Self {
            responses: pages.into_iter().map(Ok).collect(),
            ..Default::default()
        }
    }

    /// Queue a fetch error after the pages served so far.
    pub fn then_fail(mut self, error: VerifyError) -> Self {
        self.responses.push_back(Err(error));
        self
    }
}

impl ListingSource for FixtureSource {
    async fn fetch(&mut self, request: &PageRequest) -> Result<RawListing, VerifyError> {
        self.requests.push(request.clone());
        self.responses.pop_front().unwrap_or_else(|| Ok(RawListing::default()))
    }

    async fn close(&mut self) {
        self.closed = true;
    }
}

/// Fixed reference instant all fixture timestamps are relative to.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 6, 10, 0, 0).unwrap()
}

/// `base_time()` shifted by a number of seconds (negative is older).
pub fn at(offset_secs: i64) -> DateTime<Utc> {
    base_time() + Duration::seconds(offset_secs)
}

/// Build a page from `(id, seconds relative to base_time)` pairs with `more`
/// pagination controls.
pub fn page(entries: &[(u64, i64)], more: usize) -> RawListing {
    RawListing {
        timestamps: entries.iter().map(|&(_, secs)| at(secs)).collect(),
        ids: entries.iter().map(|(id, _)| id.to_string()).collect(),
        titles: entries.iter().map(|(id, _)| format!("Story {id}")).collect(),
        more_links: (0..more)
            .map(|_| format!("newest?next={}&n=31", entries.last().map_or(0, |e| e.0)))
            .collect(),
        raw: format!("<html><!-- {} entries --></html>", entries.len()),
    }
}

/// `len` strictly descending entries starting just below `from_secs`, ids
/// counting down from `from_id`.
pub fn descending_page(from_id: u64, from_secs: i64, len: usize, more: usize) -> RawListing {
    let entries: Vec<(u64, i64)> = (0..len as u64)
        .map(|i| (from_id - i, from_secs - 60 * i as i64))
        .collect();
    page(&entries, more)
}
