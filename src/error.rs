//! Error taxonomy for a verification run.
//!
//! Every variant is fatal: the walker stops at the first one and hands it to
//! the top-level runner, which decides the process exit status. Nothing here
//! is retried or downgraded to a warning.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::WalkReport;
use crate::scrapers::PageRequest;
use crate::utils::truncate_for_log;

/// Why a run stopped before verifying its target.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// An entry is newer than the entry verified right before it.
    #[error(
        "order violation at entry #{position} (id {id}, {title:?}): {timestamp} is newer than {bound}"
    )]
    OrderViolation {
        position: usize,
        id: String,
        title: String,
        timestamp: DateTime<Utc>,
        bound: DateTime<Utc>,
    },

    /// The page rendered a different number of timestamps, ids and titles.
    #[error("structural mismatch: {timestamps} timestamps, {ids} ids, {titles} titles")]
    StructuralMismatch {
        timestamps: usize,
        ids: usize,
        titles: usize,
    },

    /// More entries were needed but the page did not carry exactly one "More" control.
    #[error("navigation failure: expected exactly one pagination control, found {found}")]
    NavigationFailure { found: usize },

    /// The page listed no entries while the budget was not yet spent.
    #[error("page listed no entries with {remaining} still to verify")]
    EmptyPage { remaining: usize },

    /// An extraction point was present but its attribute could not be read.
    #[error("malformed {field} attribute: {value:?}")]
    MalformedEntry { field: &'static str, value: String },

    /// An already verified id showed up again and overlaps are not tolerated.
    #[error("entry {id} was already verified on an earlier page")]
    DuplicateEntry { id: String },

    #[error("listing session is already closed")]
    SessionClosed,

    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("invalid listing url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// A [`VerifyError`] together with the page it was detected on.
///
/// `raw_page` is the body of the offending page when one was loaded, so it can
/// be dumped for a human to look at. `progress` is what the walk had verified
/// before it stopped.
#[derive(Debug, Error)]
#[error("page {page_number} ({request}): {error}")]
pub struct WalkFailure {
    pub page_number: usize,
    pub request: PageRequest,
    pub raw_page: Option<String>,
    pub progress: WalkReport,
    #[source]
    pub error: VerifyError,
}

impl WalkFailure {
    pub fn new(page_number: usize, request: PageRequest, error: VerifyError) -> Self {
        Self {
            page_number,
            request,
            raw_page: None,
            progress: WalkReport::default(),
            error,
        }
    }

    pub fn with_page(mut self, raw: &str) -> Self {
        self.raw_page = Some(raw.to_string());
        self
    }

    /// The offending page cut down to `max` bytes for the failure log.
    pub fn page_excerpt(&self, max: usize) -> Option<String> {
        self.raw_page.as_deref().map(|raw| truncate_for_log(raw, max))
    }
}
