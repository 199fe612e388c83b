//! Output files a run can leave behind.
//!
//! # Submodules
//!
//! - [`json`]: Writes the [`RunSummary`](crate::models::RunSummary) for other tools to read
//! - [`dump`]: Saves the offending page and the error when a run fails
//!
//! # Output Structure
//!
//! ```text
//! summary.json                          # --summary-json PATH
//! dump_dir/
//! ├── failure_20250506T100000Z.html     # raw page the failure was found on
//! └── failure_20250506T100000Z.txt      # error, page number and request
//! ```

pub mod dump;
pub mod json;
