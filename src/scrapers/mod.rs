//! Listing sources: where pages of entries come from.
//!
//! The walker never touches HTTP or the DOM directly. It asks a
//! [`ListingSource`] for a page and gets back the extracted columns plus the
//! pagination controls that page carried.
//!
//! # Sources
//!
//! | Source | Module | Method |
//! |--------|--------|--------|
//! | Hacker News `/newest` | [`hackernews`] | HTML scraping |
//! | Canned pages (tests) | `fixture` | in-memory |
//!
//! # Requests
//!
//! A walk opens the listing once at a starting offset, then follows the
//! "More" control of each page, the same way a reader clicking through would.

use std::fmt;

use crate::error::VerifyError;
use crate::models::RawListing;

pub mod hackernews;

#[cfg(test)]
pub mod fixture;

/// How to reach the next page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    /// Open the listing at a numeric starting offset.
    Offset(usize),
    /// Activate a pagination control, identified by its href.
    Follow(String),
}

impl fmt::Display for PageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageRequest::Offset(n) => write!(f, "offset {n}"),
            PageRequest::Follow(href) => write!(f, "follow {href}"),
        }
    }
}

/// A session that can load listing pages.
///
/// Implementors own whatever connection or browser state a run needs; the
/// runner calls [`ListingSource::close`] exactly once when the run ends,
/// whatever the outcome.
pub trait ListingSource {
    /// Load one page and extract its entries and pagination controls.
    async fn fetch(&mut self, request: &PageRequest) -> Result<RawListing, VerifyError>;

    /// Release the session.
    async fn close(&mut self);
}
