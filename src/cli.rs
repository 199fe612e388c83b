//! Command-line interface definitions.
//!
//! All configuration comes from flags; there is no config file.

use std::path::PathBuf;

use clap::Parser;

use crate::scrapers::hackernews::DEFAULT_BASE_URL;
use crate::walker::OverlapPolicy;

/// Verify that a newest-submissions listing is sorted newest first.
///
/// # Examples
///
/// ```sh
/// # Check the first 100 entries
/// newest_order_check
///
/// # Check 300 entries, keep evidence on failure
/// newest_order_check -t 300 --dump-dir ./failures --summary-json ./run.json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Number of entries to verify
    #[arg(short, long, default_value_t = 100)]
    pub target: usize,

    /// Site root the listing lives under
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Offset of the first entry to load
    #[arg(long, default_value_t = 0)]
    pub start_offset: usize,

    /// Lower bound of the random pause between pages, in milliseconds
    #[arg(long, default_value_t = 200)]
    pub pace_min_ms: u64,

    /// Upper bound of the random pause between pages, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub pace_max_ms: u64,

    /// Per-request timeout, in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Seconds added to the current time to form the initial upper bound
    #[arg(long, default_value_t = 0)]
    pub clock_skew_secs: i64,

    /// How to treat entries repeated across page loads
    #[arg(long, value_enum, default_value_t = OverlapPolicy::Tolerate)]
    pub overlap: OverlapPolicy,

    /// Directory to write the offending page into when the run fails
    #[arg(long)]
    pub dump_dir: Option<PathBuf>,

    /// Path to write a JSON run summary to
    #[arg(long)]
    pub summary_json: Option<PathBuf>,
}

impl Cli {
    /// Reject flag combinations clap cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if self.pace_min_ms > self.pace_max_ms {
            return Err(format!(
                "--pace-min-ms ({}) must not exceed --pace-max-ms ({})",
                self.pace_min_ms, self.pace_max_ms
            ));
        }
        if self.timeout_secs == 0 {
            return Err("--timeout-secs must be positive".to_string());
        }
        Ok(())
    }
}
