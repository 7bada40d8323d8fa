use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::types::{Result, RunSummary};

/// Name of the variable the host environment reads the run count from.
pub const ENTRY_COUNT_VAR: &str = "RSS_FEED_ENTRIES";

pub fn summary_line(summary: &RunSummary) -> String {
    format!("{}={}", ENTRY_COUNT_VAR, summary.new_entries)
}

pub fn summary_json(summary: &RunSummary) -> Result<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}

/// Append the count to a CI environment file such as the one named by
/// `GITHUB_ENV`.
pub fn append_env_file(path: &Path, summary: &RunSummary) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", summary_line(summary))?;
    Ok(())
}
