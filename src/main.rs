//! # Newest Order Check
//!
//! Walks a news aggregator's "newest submissions" listing page by page and
//! verifies the first N entries are sorted newest first.
//!
//! ## Usage
//!
//! ```sh
//! newest_order_check -t 100 --dump-dir ./failures
//! ```
//!
//! ## Architecture
//!
//! 1. **Session**: open one HTTP session against the site
//! 2. **Walk**: load a page, pair timestamps with ids and titles, check each
//!    entry is not newer than the one before, follow "More"
//! 3. **Release**: close the session on every outcome
//! 4. **Report**: log a PASS/FAIL banner, optionally dump the offending page
//!    and write a JSON summary
//!
//! Exit status is 0 when the target was verified, 1 when verification failed
//! and 2 when the run could not be set up or its outputs could not be written.

use chrono::{TimeDelta, Utc};
use clap::Parser;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod error;
mod models;
mod outputs;
mod scrapers;
mod utils;
mod walker;

use cli::Cli;
use models::RunSummary;
use outputs::{dump, json};
use scrapers::hackernews::HackerNewsSource;
use walker::{Pacing, WalkConfig};

const EXIT_VERIFY_FAILED: u8 = 1;
const EXIT_SETUP_FAILED: u8 = 2;
const PAGE_EXCERPT_BYTES: usize = 4000;

#[tokio::main]
async fn main() -> ExitCode {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = Instant::now();
    let started_at = Utc::now();
    info!("newest_order_check starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    if let Err(e) = args.validate() {
        error!(error = %e, "Invalid arguments");
        return ExitCode::from(EXIT_SETUP_FAILED);
    }

    let mut source =
        match HackerNewsSource::new(&args.base_url, Duration::from_secs(args.timeout_secs)) {
            Ok(source) => source,
            Err(e) => {
                error!(base_url = %args.base_url, error = %e, "Could not open listing session");
                return ExitCode::from(EXIT_SETUP_FAILED);
            }
        };

    let config = WalkConfig {
        target: args.target,
        start_offset: args.start_offset,
        initial_bound: started_at + TimeDelta::seconds(args.clock_skew_secs),
        pacing: Pacing::new(args.pace_min_ms, args.pace_max_ms),
        overlap: args.overlap,
    };
    info!(
        target = config.target,
        start_offset = config.start_offset,
        initial_bound = %config.initial_bound,
        overlap = ?config.overlap,
        "Starting walk"
    );

    let outcome = walker::run(&mut source, &config).await;
    let elapsed = start_time.elapsed();

    let mut exit = match &outcome {
        Ok(report) => {
            info!(
                verified = report.verified,
                pages = report.pages_fetched,
                duplicates_skipped = report.duplicates_skipped,
                newest = ?report.newest,
                oldest = ?report.oldest,
                ?elapsed,
                "PASS: first {} entries are sorted newest first",
                report.verified
            );
            ExitCode::SUCCESS
        }
        Err(failure) => {
            error!(
                page = failure.page_number,
                request = %failure.request,
                verified = failure.progress.verified,
                error = %failure.error,
                ?elapsed,
                "FAIL: listing is not verifiably sorted newest first"
            );
            if let Some(excerpt) = failure.page_excerpt(PAGE_EXCERPT_BYTES) {
                error!(page = failure.page_number, content = %excerpt, "Offending page");
            }

            if let Some(dir) = &args.dump_dir {
                match dump::write_failure_dump(failure, dir, Utc::now()).await {
                    Ok(files) => info!(?files, "Saved failure evidence"),
                    Err(e) => warn!(dir = %dir.display(), error = %e, "Failed to write failure dump"),
                }
            }
            ExitCode::from(EXIT_VERIFY_FAILED)
        }
    };

    if let Some(path) = &args.summary_json {
        let summary = RunSummary::new(&outcome, args.target, started_at, elapsed);
        if let Err(e) = json::write_run_summary(&summary, path).await {
            error!(path = %path.display(), error = %e, "Failed to write run summary");
            if outcome.is_ok() {
                exit = ExitCode::from(EXIT_SETUP_FAILED);
            }
        }
    }

    exit
}
