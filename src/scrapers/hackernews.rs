//! Hacker News `/newest` listing scraper.
//!
//! This module loads pages from [Hacker News](https://news.ycombinator.com)
//! over plain HTTP and reads them with `scraper`. The listing is server
//! rendered, so no JavaScript engine is required.
//!
//! # Extraction points
//!
//! | Column | Selector | Attribute |
//! |--------|----------|-----------|
//! | timestamp | `span.age` | `title`, `"2025-05-06T10:00:00 1746525600"` |
//! | id | `span.score` | `id`, `"score_<id>"` |
//! | title | `span.titleline > a` | text |
//! | pagination | `a.morelink` | `href` |
//!
//! # URL Pattern
//!
//! The first page is opened by offset (`/newest?n=31` starts at the 31st
//! entry). Later pages follow the `More` link, which pins the listing with a
//! `next=<id>` argument so new submissions do not shift it mid-run.

use std::time::Duration;

use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

use super::{ListingSource, PageRequest};
use crate::error::VerifyError;
use crate::models::RawListing;
use crate::utils::parse_age_attr;

pub const DEFAULT_BASE_URL: &str = "https://news.ycombinator.com";
const LISTING_PATH: &str = "newest";
const ID_PREFIX: &str = "score_";

static AGE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("span.age").unwrap());
static SCORE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("span.score").unwrap());
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.titleline > a").unwrap());
static MORE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a.morelink").unwrap());

/// One HTTP session against a Hacker News compatible site.
#[derive(Debug)]
pub struct HackerNewsSource {
    base: Url,
    client: Option<Client>,
}

impl HackerNewsSource {
    /// Open a session against `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse or the HTTP client
    /// cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, VerifyError> {
        let base = Url::parse(base_url)?;
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        info!(%base, ?timeout, "Opened listing session");
        Ok(Self {
            base,
            client: Some(client),
        })
    }

    /// Resolve a request to the absolute URL it loads.
    pub fn url_for(&self, request: &PageRequest) -> Result<Url, VerifyError> {
        match request {
            PageRequest::Offset(0) => Ok(self.base.join(LISTING_PATH)?),
            PageRequest::Offset(n) => {
                let mut url = self.base.join(LISTING_PATH)?;
                // the site's `n` argument is the 1-based rank of the first entry
                url.query_pairs_mut().append_pair("n", &(n + 1).to_string());
                Ok(url)
            }
            PageRequest::Follow(href) => Ok(self.base.join(href)?),
        }
    }
}

impl ListingSource for HackerNewsSource {
    #[instrument(level = "info", skip_all, fields(%request))]
    async fn fetch(&mut self, request: &PageRequest) -> Result<RawListing, VerifyError> {
        let url = self.url_for(request)?;
        let client = self.client.as_ref().ok_or(VerifyError::SessionClosed)?;

        let body = client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        debug!(%url, bytes = body.len(), "Fetched listing page");

        parse_listing(body)
    }

    async fn close(&mut self) {
        if self.client.take().is_some() {
            info!(base = %self.base, "Closed listing session");
        }
    }
}

/// Extract the entry columns and pagination controls from a listing page.
///
/// Columns are extracted independently; pairing them is left to
/// [`RawListing::into_entries`].
///
/// # Errors
///
/// [`VerifyError::MalformedEntry`] if an age marker has no readable time or a
/// score marker's id lacks the `score_` prefix.
pub fn parse_listing(body: String) -> Result<RawListing, VerifyError> {
    let document = Html::parse_document(&body);

    let timestamps = document
        .select(&AGE_SELECTOR)
        .map(|el| {
            let value = attr(el, "title");
            parse_age_attr(value).ok_or_else(|| VerifyError::MalformedEntry {
                field: "age title",
                value: value.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let ids = document
        .select(&SCORE_SELECTOR)
        .map(|el| {
            let value = attr(el, "id");
            match value.strip_prefix(ID_PREFIX) {
                Some(id) if !id.is_empty() => Ok(id.to_string()),
                _ => Err(VerifyError::MalformedEntry {
                    field: "score id",
                    value: value.to_string(),
                }),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    let titles = document
        .select(&TITLE_SELECTOR)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .collect::<Vec<_>>();

    let more_links = document
        .select(&MORE_SELECTOR)
        .map(|el| attr(el, "href").to_string())
        .collect::<Vec<_>>();

    debug!(
        timestamps = timestamps.len(),
        ids = ids.len(),
        titles = titles.len(),
        more_links = more_links.len(),
        "Parsed listing page"
    );

    Ok(RawListing {
        timestamps,
        ids,
        titles,
        more_links,
        raw: body,
    })
}

fn attr<'a>(el: ElementRef<'a>, name: &str) -> &'a str {
    el.value().attr(name).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn row(id: u64, title: &str, iso: &str, unix: i64) -> String {
        format!(
            r#"<tr class="athing submission" id="{id}">
                 <td class="title"><span class="titleline"><a href="https://example.com/{id}">{title}</a>
                 <span class="sitebit comhead"> (<a href="from?site=example.com"><span class="sitestr">example.com</span></a>)</span></span></td>
               </tr>
               <tr><td colspan="2"></td><td class="subtext"><span class="subline">
                 <span class="score" id="score_{id}">1 point</span> by <a href="user?id=someone" class="hnuser">someone</a>
                 <span class="age" title="{iso} {unix}"><a href="item?id={id}">1 minute ago</a></span>
               </span></td></tr>"#
        )
    }

    fn listing(rows: &[String], more: bool) -> String {
        let more = if more {
            r#"<tr class="morespace"></tr><tr><td colspan="2"></td><td class="title"><a href="newest?next=40000001&amp;n=31" class="morelink" rel="next">More</a></td></tr>"#
        } else {
            ""
        };
        format!(
            "<html><body><table id=\"hnmain\"><tr><td><table>{}{}</table></td></tr></table></body></html>",
            rows.join("\n"),
            more
        )
    }

    #[test]
    fn test_parse_listing_extracts_all_columns() {
        let html = listing(
            &[
                row(40000003, "Show HN: A thing", "2025-05-06T10:00:00", 1746525600),
                row(40000002, "Ask HN: Another &amp; more", "2025-05-06T09:59:00", 1746525540),
            ],
            true,
        );

        let page = parse_listing(html).unwrap();
        assert_eq!(page.ids, vec!["40000003", "40000002"]);
        assert_eq!(page.titles, vec!["Show HN: A thing", "Ask HN: Another & more"]);
        assert_eq!(
            page.timestamps,
            vec![
                Utc.with_ymd_and_hms(2025, 5, 6, 10, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2025, 5, 6, 9, 59, 0).unwrap(),
            ]
        );
        assert_eq!(page.more_links, vec!["newest?next=40000001&n=31"]);
        assert!(page.raw.contains("hnmain"));
    }

    #[test]
    fn test_parse_listing_ignores_site_links_in_titles() {
        let html = listing(&[row(7, "Title", "2025-05-06T10:00:00", 1746525600)], false);
        let page = parse_listing(html).unwrap();
        assert_eq!(page.titles.len(), 1);
        assert!(page.more_links.is_empty());
    }

    #[test]
    fn test_parse_listing_keeps_uneven_columns_for_the_walker() {
        // a job posting has no score marker
        let job = r#"<tr class="athing"><td class="title"><span class="titleline"><a href="item?id=9">Acme is hiring</a></span></td></tr>
                     <tr><td class="subtext"><span class="age" title="2025-05-06T09:58:00 1746525480"><a href="item?id=9">3 minutes ago</a></span></td></tr>"#;
        let html = listing(
            &[row(10, "Story", "2025-05-06T10:00:00", 1746525600), job.to_string()],
            true,
        );

        let page = parse_listing(html).unwrap();
        assert_eq!(page.timestamps.len(), 2);
        assert_eq!(page.titles.len(), 2);
        assert_eq!(page.ids.len(), 1);
        assert!(matches!(
            page.into_entries(),
            Err(VerifyError::StructuralMismatch { timestamps: 2, ids: 1, titles: 2 })
        ));
    }

    #[test]
    fn test_parse_listing_rejects_bad_age_attribute() {
        let html = listing(&[row(10, "Story", "yesterday", 0)], false)
            .replace("yesterday 0", "yesterday");
        match parse_listing(html) {
            Err(VerifyError::MalformedEntry { field, value }) => {
                assert_eq!(field, "age title");
                assert_eq!(value, "yesterday");
            }
            other => panic!("expected malformed entry, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_listing_rejects_unprefixed_score_id() {
        let html = listing(&[row(10, "Story", "2025-05-06T10:00:00", 1746525600)], false)
            .replace("score_10", "points_10");
        assert!(matches!(
            parse_listing(html),
            Err(VerifyError::MalformedEntry { field: "score id", .. })
        ));
    }

    #[test]
    fn test_url_for_requests() {
        let source = HackerNewsSource::new(DEFAULT_BASE_URL, Duration::from_secs(5)).unwrap();

        assert_eq!(
            source.url_for(&PageRequest::Offset(0)).unwrap().as_str(),
            "https://news.ycombinator.com/newest"
        );
        assert_eq!(
            source.url_for(&PageRequest::Offset(30)).unwrap().as_str(),
            "https://news.ycombinator.com/newest?n=31"
        );
        assert_eq!(
            source
                .url_for(&PageRequest::Follow("newest?next=123&n=31".to_string()))
                .unwrap()
                .as_str(),
            "https://news.ycombinator.com/newest?next=123&n=31"
        );
    }

    #[tokio::test]
    async fn test_fetch_after_close_is_rejected() {
        let mut source = HackerNewsSource::new(DEFAULT_BASE_URL, Duration::from_secs(5)).unwrap();
        source.close().await;
        assert!(matches!(
            source.fetch(&PageRequest::Offset(0)).await,
            Err(VerifyError::SessionClosed)
        ));
    }
}
